use crate::models::categories::CategoryKind;
use crate::models::transactions::Transaction;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct TransactionRepository {
    conn: PgPool,
}

impl TransactionRepository {
    pub fn new(conn: PgPool) -> Self {
        TransactionRepository { conn }
    }

    /// Inserts the transaction row and applies `delta` to the wallet balance
    /// in a single database transaction. The UPDATE takes the wallet row lock,
    /// serializing concurrent posts against the same wallet.
    pub async fn insert_with_balance(
        &self,
        user_id: &str,
        wallet_id: &str,
        category_id: &str,
        amount: Decimal,
        kind: CategoryKind,
        note: Option<&str>,
        occurred_at: chrono::NaiveDateTime,
        delta: Decimal,
    ) -> Result<Transaction, anyhow::Error> {
        let transaction_id = Uuid::new_v4().hyphenated().to_string();
        let mut tx = self.conn.begin().await?;

        sqlx::query(
            "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(delta)
        .bind(wallet_id)
        .execute(&mut *tx)
        .await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
                INSERT INTO transactions
                (id, user_id, wallet_id, category_id, amount, kind, note, occurred_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
            "#,
        )
        .bind(&transaction_id)
        .bind(user_id)
        .bind(wallet_id)
        .bind(category_id)
        .bind(amount)
        .bind(kind)
        .bind(note)
        .bind(occurred_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Deletes the transaction row and reverts its balance effect atomically.
    pub async fn delete_with_balance(
        &self,
        transaction_id: &str,
        wallet_id: &str,
        inverse_delta: Decimal,
    ) -> Result<(), anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        sqlx::query(
            "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(inverse_delta)
        .bind(wallet_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Rewrites a transaction: reverts the old delta on the old wallet,
    /// applies the new delta (possibly on another wallet) and updates the
    /// row, all inside one database transaction.
    pub async fn update_with_balance(
        &self,
        transaction_id: &str,
        old_wallet_id: &str,
        inverse_delta: Decimal,
        new_wallet_id: &str,
        new_category_id: &str,
        amount: Decimal,
        kind: CategoryKind,
        note: Option<&str>,
        occurred_at: chrono::NaiveDateTime,
        delta: Decimal,
    ) -> Result<Transaction, anyhow::Error> {
        let mut tx = self.conn.begin().await?;

        sqlx::query(
            "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(inverse_delta)
        .bind(old_wallet_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE wallets SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2",
        )
        .bind(delta)
        .bind(new_wallet_id)
        .execute(&mut *tx)
        .await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
                UPDATE transactions
                SET wallet_id = $2, category_id = $3, amount = $4, kind = $5,
                    note = $6, occurred_at = $7, updated_at = CURRENT_TIMESTAMP
                WHERE id = $1
                RETURNING *
            "#,
        )
        .bind(transaction_id)
        .bind(new_wallet_id)
        .bind(new_category_id)
        .bind(amount)
        .bind(kind)
        .bind(note)
        .bind(occurred_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    pub async fn get_transaction(
        &self,
        transaction_id: &str,
        user_id: &str,
    ) -> Result<Option<Transaction>, anyhow::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(
            "SELECT * FROM transactions WHERE id = $1 AND user_id = $2",
        )
        .bind(transaction_id)
        .bind(user_id)
        .fetch_optional(&self.conn)
        .await?;

        Ok(transaction)
    }

    pub async fn list_transactions(
        &self,
        user_id: &str,
        wallet_id: Option<&str>,
    ) -> Result<Vec<Transaction>, anyhow::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(
            r#"
                SELECT * FROM transactions
                WHERE user_id = $1 AND ($2::text IS NULL OR wallet_id = $2)
                ORDER BY occurred_at DESC
            "#,
        )
        .bind(user_id)
        .bind(wallet_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(transactions)
    }

    pub async fn count_for_user(&self, user_id: &str) -> Result<i64, anyhow::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.conn)
            .await?;

        Ok(count)
    }
}
