use crate::models::budgets::{Budget, BudgetStatus};

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct BudgetRepository {
    conn: PgPool,
}

impl BudgetRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn insert_budget(
        &self,
        user_id: &str,
        category_id: &str,
        amount: Decimal,
        month: &str,
    ) -> Result<Budget, anyhow::Error> {
        let budget_id = Uuid::new_v4().hyphenated().to_string();

        let budget = sqlx::query_as::<_, Budget>(
            r#"
                INSERT INTO budgets (id, user_id, category_id, amount, month)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *
            "#,
        )
        .bind(&budget_id)
        .bind(user_id)
        .bind(category_id)
        .bind(amount)
        .bind(month)
        .fetch_one(&self.conn)
        .await?;

        Ok(budget)
    }

    pub async fn exists(
        &self,
        user_id: &str,
        category_id: &str,
        month: &str,
    ) -> Result<bool, anyhow::Error> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(1) FROM budgets WHERE user_id = $1 AND category_id = $2 AND month = $3",
        )
        .bind(user_id)
        .bind(category_id)
        .bind(month)
        .fetch_one(&self.conn)
        .await?;

        Ok(count > 0)
    }

    /// Lists budgets with the expense total already posted against each
    /// budget's category in its month.
    pub async fn list_with_spent(&self, user_id: &str) -> Result<Vec<BudgetStatus>, anyhow::Error> {
        let budgets = sqlx::query_as::<_, BudgetStatus>(
            r#"
                SELECT b.id, b.category_id, b.amount, b.month,
                       COALESCE(SUM(t.amount), 0) AS spent
                FROM budgets b
                LEFT JOIN transactions t
                  ON t.category_id = b.category_id
                 AND t.user_id = b.user_id
                 AND t.kind = 'EXPENSE'
                 AND TO_CHAR(t.occurred_at, 'YYYY-MM') = b.month
                WHERE b.user_id = $1
                GROUP BY b.id, b.category_id, b.amount, b.month
                ORDER BY b.month DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(budgets)
    }

    pub async fn delete_budget(&self, budget_id: &str, user_id: &str) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(budget_id)
            .bind(user_id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
