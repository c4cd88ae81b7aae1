use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Achievement {
    pub id: String,
    pub user_id: String,
    pub code: String,
    pub title: String,
    pub unlocked_at: chrono::NaiveDateTime,
}
