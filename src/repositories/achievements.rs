use crate::models::achievements::Achievement;

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct AchievementRepository {
    conn: PgPool,
}

impl AchievementRepository {
    pub fn new(conn: PgPool) -> Self {
        Self { conn }
    }

    /// Idempotent: unlocking an already-unlocked achievement is a no-op.
    pub async fn unlock(&self, user_id: &str, code: &str, title: &str) -> Result<(), anyhow::Error> {
        let achievement_id = Uuid::new_v4().hyphenated().to_string();

        sqlx::query(
            r#"
                INSERT INTO achievements (id, user_id, code, title)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (user_id, code) DO NOTHING
            "#,
        )
        .bind(&achievement_id)
        .bind(user_id)
        .bind(code)
        .bind(title)
        .execute(&self.conn)
        .await?;

        Ok(())
    }

    pub async fn list_achievements(&self, user_id: &str) -> Result<Vec<Achievement>, anyhow::Error> {
        let achievements = sqlx::query_as::<_, Achievement>(
            "SELECT * FROM achievements WHERE user_id = $1 ORDER BY unlocked_at",
        )
        .bind(user_id)
        .fetch_all(&self.conn)
        .await?;

        Ok(achievements)
    }
}
