use sqlx::postgres::PgPoolOptions;

mod models;
mod repositories;
pub mod services;
pub mod settings;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let config = settings::Settings::new().expect("Could not load config file.");
    log4rs::init_file("log4rs.yaml", Default::default())
        .expect("Could not initialize logging.");

    let conn = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .connect(&config.postgres.url)
        .await
        .expect("Could not connect to database.");

    sqlx::migrate!("./migrations")
        .run(&conn)
        .await
        .expect("Could not run migrations.");

    log::info!("Starting HTTP server.");
    services::http::start_http_server(conn, config)
        .await
        .expect("Could not start HTTP server.");
}
