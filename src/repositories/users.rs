use crate::models::users::User;

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserRepository {
    conn: PgPool,
}

impl UserRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: &str,
    ) -> Result<User, anyhow::Error> {
        let user_id = Uuid::new_v4().hyphenated().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
                INSERT INTO users (id, email, password_hash, full_name, role)
                VALUES ($1, $2, $3, $4, 'USER')
                RETURNING *
            "#,
        )
        .bind(&user_id)
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .fetch_one(&self.conn)
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.conn)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, anyhow::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM users WHERE email = $1")
            .bind(email)
            .fetch_one(&self.conn)
            .await?;

        Ok(count > 0)
    }

    pub async fn bump_token_version(&self, user_id: &str) -> Result<i32, anyhow::Error> {
        let version: i32 = sqlx::query_scalar(
            r#"
                UPDATE users
                SET token_version = token_version + 1, updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING token_version
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.conn)
        .await?;

        Ok(version)
    }

    pub async fn set_totp_secret(
        &self,
        user_id: &str,
        secret: Option<&str>,
    ) -> Result<(), anyhow::Error> {
        sqlx::query(
            "UPDATE users SET totp_secret = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(secret)
        .bind(user_id)
        .execute(&self.conn)
        .await?;

        Ok(())
    }
}
