use axum::{
    extract::Request,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use super::accounts::AccountService;
use super::email::Mailer;
use super::ledger::LedgerService;
use super::tokens::TokenService;
use super::totp::TotpService;
use super::ServiceError;
use crate::repositories::achievements::AchievementRepository;
use crate::repositories::budgets::BudgetRepository;
use crate::repositories::categories::CategoryRepository;
use crate::repositories::users::UserRepository;
use crate::repositories::wallets::WalletRepository;
use crate::settings::Settings;

mod achievements;
mod auth;
mod budgets;
mod categories;
pub mod gate;
mod transactions;
mod wallets;

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub ledger: LedgerService,
    pub tokens: TokenService,
    pub users: UserRepository,
    pub wallets: WalletRepository,
    pub categories: CategoryRepository,
    pub budgets: BudgetRepository,
    pub achievements: AchievementRepository,
}

pub async fn start_http_server(pool: PgPool, settings: Settings) -> Result<(), anyhow::Error> {
    let tokens = TokenService::new(&settings.jwt);
    let totp = TotpService::new(&settings.totp.issuer);
    let mailer = Mailer::new(settings.email.clone());

    let state = AppState {
        accounts: AccountService::new(
            pool.clone(),
            tokens.clone(),
            totp.clone(),
            mailer,
            &settings,
        ),
        ledger: LedgerService::new(pool.clone()),
        tokens,
        users: UserRepository::new(pool.clone()),
        wallets: WalletRepository::new(pool.clone()),
        categories: CategoryRepository::new(pool.clone()),
        budgets: BudgetRepository::new(pool.clone()),
        achievements: AchievementRepository::new(pool),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(format!(
        "{}:{}",
        settings.server.host, settings.server.port
    ))
    .await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::authenticate,
        ))
        .layer(middleware::from_fn(render_error_envelope))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/logout-all", post(auth::logout_all))
        .route("/auth/2fa/setup", post(auth::totp_setup))
        .route("/auth/2fa/disable", post(auth::totp_disable))
        .route("/wallets", post(wallets::create).get(wallets::list))
        .route(
            "/wallets/{id}",
            get(wallets::get).put(wallets::update).delete(wallets::remove),
        )
        .route("/categories", post(categories::create).get(categories::list))
        .route(
            "/categories/{id}",
            put(categories::update).delete(categories::remove),
        )
        .route(
            "/transactions",
            post(transactions::create).get(transactions::list),
        )
        .route(
            "/transactions/{id}",
            put(transactions::update).delete(transactions::remove),
        )
        .route("/budgets", post(budgets::create).get(budgets::list))
        .route("/budgets/{id}", delete(budgets::remove))
        .route("/achievements", get(achievements::list))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    timestamp: String,
    status: u16,
    error_code: &'static str,
    message: String,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::BadRequest(_) => "BAD_REQUEST",
            ServiceError::Unauthorized(_) => "UNAUTHORIZED",
            ServiceError::NotFound(_) => "NOT_FOUND",
            ServiceError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Internal failures are logged in full but never shown to clients.
    fn client_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        if let ServiceError::Internal(detail) = &self {
            log::error!("Internal error: {}", detail);
        }

        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Single response-building boundary: every error leaving the service, the
/// gate or axum itself is rendered as the structured JSON envelope here,
/// where the request path is still known.
async fn render_error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status = response.status();

    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let (status, error_code, message) = match response.extensions().get::<ServiceError>() {
        Some(err) => (err.status(), err.error_code(), err.client_message()),
        None => normalize_native_status(status),
    };

    let body = ErrorBody {
        timestamp: chrono::Utc::now().to_rfc3339(),
        status: status.as_u16(),
        error_code,
        message,
        path,
        details: None,
    };

    (status, Json(body)).into_response()
}

/// Maps responses axum produced on its own (extractor rejections, unmatched
/// routes) onto the closed error-code set.
fn normalize_native_status(status: StatusCode) -> (StatusCode, &'static str, String) {
    match status {
        StatusCode::UNAUTHORIZED => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authentication required".to_string(),
        ),
        StatusCode::NOT_FOUND => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        ),
        StatusCode::BAD_REQUEST
        | StatusCode::UNPROCESSABLE_ENTITY
        | StatusCode::UNSUPPORTED_MEDIA_TYPE => (
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Malformed request".to_string(),
        ),
        s if s.is_server_error() => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An unexpected error occurred".to_string(),
        ),
        other => (other, "BAD_REQUEST", "Request failed".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_status_and_code() {
        let cases = [
            (ServiceError::validation("x"), 400, "VALIDATION_ERROR"),
            (ServiceError::bad_request("x"), 400, "BAD_REQUEST"),
            (ServiceError::unauthorized("x"), 401, "UNAUTHORIZED"),
            (ServiceError::not_found("x"), 404, "NOT_FOUND"),
            (ServiceError::Internal("x".into()), 500, "INTERNAL_ERROR"),
        ];

        for (err, status, code) in cases {
            assert_eq!(err.status().as_u16(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn internal_detail_is_hidden_from_clients() {
        let err = ServiceError::Internal("connection refused (db=10.0.0.3)".into());

        assert_eq!(err.client_message(), "An unexpected error occurred");
        assert!(!err.client_message().contains("10.0.0.3"));
    }

    #[test]
    fn native_rejections_collapse_into_the_closed_code_set() {
        let (status, code, _) = normalize_native_status(StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");

        let (status, code, _) = normalize_native_status(StatusCode::BAD_GATEWAY);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }
}
