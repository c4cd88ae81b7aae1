use crate::models::categories::{Category, CategoryKind};

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct CategoryRepository {
    conn: PgPool,
}

impl CategoryRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    pub async fn insert_category(
        &self,
        user_id: &str,
        name: &str,
        kind: CategoryKind,
    ) -> Result<Category, anyhow::Error> {
        let category_id = Uuid::new_v4().hyphenated().to_string();

        let category = sqlx::query_as::<_, Category>(
            r#"
                INSERT INTO categories (id, user_id, name, kind)
                VALUES ($1, $2, $3, $4)
                RETURNING *
            "#,
        )
        .bind(&category_id)
        .bind(user_id)
        .bind(name)
        .bind(kind)
        .fetch_one(&self.conn)
        .await?;

        Ok(category)
    }

    pub async fn get_category(
        &self,
        category_id: &str,
        user_id: &str,
    ) -> Result<Option<Category>, anyhow::Error> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1 AND user_id = $2")
                .bind(category_id)
                .bind(user_id)
                .fetch_optional(&self.conn)
                .await?;

        Ok(category)
    }

    pub async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>, anyhow::Error> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT * FROM categories WHERE user_id = $1 ORDER BY kind, name",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(categories)
    }

    pub async fn rename_category(
        &self,
        category_id: &str,
        user_id: &str,
        name: &str,
    ) -> Result<Option<Category>, anyhow::Error> {
        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $3 WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(category_id)
        .bind(user_id)
        .bind(name)
        .fetch_optional(&self.conn)
        .await?;

        Ok(category)
    }

    pub async fn delete_category(
        &self,
        category_id: &str,
        user_id: &str,
    ) -> Result<bool, anyhow::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1 AND user_id = $2")
            .bind(category_id)
            .bind(user_id)
            .execute(&self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn transaction_count(&self, category_id: &str) -> Result<i64, anyhow::Error> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM transactions WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(&self.conn)
                .await?;

        Ok(count)
    }
}
