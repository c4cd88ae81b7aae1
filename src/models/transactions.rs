use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::categories::CategoryKind;

#[derive(Clone, Debug, Deserialize, Serialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub kind: CategoryKind,
    pub note: Option<String>,
    pub occurred_at: chrono::NaiveDateTime,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Clone, Debug, Deserialize)]
pub struct NewTransaction {
    pub wallet_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub kind: CategoryKind,
    pub note: Option<String>,
    pub occurred_at: Option<chrono::NaiveDateTime>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TransactionFilter {
    pub wallet_id: Option<String>,
}
