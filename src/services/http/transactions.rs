use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::gate::CurrentUser;
use super::AppState;
use crate::models::transactions::{NewTransaction, TransactionFilter};
use crate::services::ServiceError;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<NewTransaction>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.ledger.create(&identity.user_id, &req).await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Query(filter): Query<TransactionFilter>,
) -> Result<impl IntoResponse, ServiceError> {
    let transactions = state
        .ledger
        .list(&identity.user_id, filter.wallet_id.as_deref())
        .await?;

    Ok(Json(transactions))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<NewTransaction>,
) -> Result<impl IntoResponse, ServiceError> {
    let transaction = state.ledger.update(&id, &identity.user_id, &req).await?;

    Ok(Json(transaction))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    state.ledger.delete(&id, &identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
