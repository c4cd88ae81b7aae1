use crate::models::wallets::{UpdateWallet, Wallet, WalletKind};

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct WalletRepository {
    conn: PgPool,
}

impl WalletRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn insert_wallet(
        &self,
        user_id: &str,
        name: &str,
        kind: WalletKind,
        currency: &str,
        is_default: bool,
    ) -> Result<Wallet, anyhow::Error> {
        let wallet_id = Uuid::new_v4().hyphenated().to_string();

        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
                INSERT INTO wallets (id, user_id, name, kind, currency, balance, is_default)
                VALUES ($1, $2, $3, $4, $5, 0, $6)
                RETURNING *
            "#,
        )
        .bind(&wallet_id)
        .bind(user_id)
        .bind(name)
        .bind(kind)
        .bind(currency)
        .bind(is_default)
        .fetch_one(&self.conn)
        .await?;

        Ok(wallet)
    }

    pub async fn get_wallet(
        &self,
        wallet_id: &str,
        user_id: &str,
    ) -> Result<Option<Wallet>, anyhow::Error> {
        let wallet =
            sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE id = $1 AND user_id = $2")
                .bind(wallet_id)
                .bind(user_id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(wallet)
    }

    pub async fn list_wallets(&self, user_id: &str) -> Result<Vec<Wallet>, anyhow::Error> {
        let wallets = sqlx::query_as::<_, Wallet>(
            "SELECT * FROM wallets WHERE user_id = $1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(wallets)
    }

    pub async fn update_wallet(
        &self,
        wallet_id: &str,
        user_id: &str,
        changes: &UpdateWallet,
    ) -> Result<Option<Wallet>, anyhow::Error> {
        let wallet = sqlx::query_as::<_, Wallet>(
            r#"
                UPDATE wallets
                SET name = COALESCE($3, name),
                    kind = COALESCE($4, kind),
                    currency = COALESCE($5, currency),
                    is_default = COALESCE($6, is_default),
                    updated_at = CURRENT_TIMESTAMP
                WHERE id = $1 AND user_id = $2
                RETURNING *
            "#,
        )
        .bind(wallet_id)
        .bind(user_id)
        .bind(changes.name.as_deref())
        .bind(changes.kind)
        .bind(changes.currency.as_deref())
        .bind(changes.is_default)
        .fetch_optional(&self.conn)
        .await?;

        Ok(wallet)
    }

    pub async fn delete_wallet(&self, wallet_id: &str, user_id: &str) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM wallets WHERE id = $1 AND user_id = $2")
            .bind(wallet_id)
            .bind(user_id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn transaction_count(&self, wallet_id: &str) -> Result<i64, anyhow::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM transactions WHERE wallet_id = $1")
                .bind(wallet_id)
                .fetch_one(&self.conn)
                .await?;

        Ok(count)
    }
}
