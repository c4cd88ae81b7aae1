use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::gate::CurrentUser;
use super::AppState;
use crate::models::categories::{NewCategory, UpdateCategory};
use crate::services::ServiceError;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<NewCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::validation("Category name must not be empty"));
    }

    let category = state
        .categories
        .insert_category(&identity.user_id, req.name.trim(), req.kind)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let categories = state.categories.list_categories(&identity.user_id).await?;

    Ok(Json(categories))
}

/// Renames only. The kind is fixed at creation, transactions posted under
/// the category depend on it.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateCategory>,
) -> Result<impl IntoResponse, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::validation("Category name must not be empty"));
    }

    let category = state
        .categories
        .rename_category(&id, &identity.user_id, req.name.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("Category not found"))?;

    Ok(Json(category))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let category = state
        .categories
        .get_category(&id, &identity.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Category not found"))?;

    if state.categories.transaction_count(&category.id).await? > 0 {
        return Err(ServiceError::bad_request(
            "Category is still used by transactions",
        ));
    }

    state
        .categories
        .delete_category(&category.id, &identity.user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
