use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;

use super::gate::CurrentUser;
use super::AppState;
use crate::models::budgets::NewBudget;
use crate::services::ServiceError;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<NewBudget>,
) -> Result<impl IntoResponse, ServiceError> {
    if req.amount <= Decimal::ZERO {
        return Err(ServiceError::validation("Amount must be positive"));
    }
    if !is_month(&req.month) {
        return Err(ServiceError::validation("Month must be formatted YYYY-MM"));
    }

    let category = state
        .categories
        .get_category(&req.category_id, &identity.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Category not found"))?;

    if state
        .budgets
        .exists(&identity.user_id, &category.id, &req.month)
        .await?
    {
        return Err(ServiceError::bad_request(
            "A budget for this category and month already exists",
        ));
    }

    let budget = state
        .budgets
        .insert_budget(&identity.user_id, &category.id, req.amount, &req.month)
        .await?;

    Ok((StatusCode::CREATED, Json(budget)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let budgets = state.budgets.list_with_spent(&identity.user_id).await?;

    Ok(Json(budgets))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    if !state.budgets.delete_budget(&id, &identity.user_id).await? {
        return Err(ServiceError::not_found("Budget not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

fn is_month(month: &str) -> bool {
    let bytes = month.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    if !bytes[..4].iter().all(|b| b.is_ascii_digit())
        || !bytes[5..].iter().all(|b| b.is_ascii_digit())
    {
        return false;
    }

    matches!(month[5..].parse::<u8>(), Ok(1..=12))
}

#[cfg(test)]
mod tests {
    use super::is_month;

    #[test]
    fn month_format() {
        assert!(is_month("2025-01"));
        assert!(is_month("2025-12"));
        assert!(!is_month("2025-13"));
        assert!(!is_month("2025-00"));
        assert!(!is_month("2025-1"));
        assert!(!is_month("25-01"));
        assert!(!is_month("2025/01"));
    }
}
