use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Budget {
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub month: String,
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct BudgetStatus {
    pub id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub month: String,
    pub spent: Decimal,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewBudget {
    pub category_id: String,
    pub amount: Decimal,
    pub month: String,
}
