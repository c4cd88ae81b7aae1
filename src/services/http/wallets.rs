use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::gate::CurrentUser;
use super::AppState;
use crate::models::wallets::{NewWallet, UpdateWallet};
use crate::services::ServiceError;

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<NewWallet>,
) -> Result<impl IntoResponse, ServiceError> {
    if req.name.trim().is_empty() {
        return Err(ServiceError::validation("Wallet name must not be empty"));
    }

    let wallet = state
        .wallets
        .insert_wallet(
            &identity.user_id,
            req.name.trim(),
            req.kind,
            &req.currency,
            req.is_default,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let wallets = state.wallets.list_wallets(&identity.user_id).await?;

    Ok(Json(wallets))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let wallet = state
        .wallets
        .get_wallet(&id, &identity.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Wallet not found"))?;

    Ok(Json(wallet))
}

/// Metadata only. The balance is never edited here, it moves exclusively
/// through the ledger.
pub async fn update(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateWallet>,
) -> Result<impl IntoResponse, ServiceError> {
    let wallet = state
        .wallets
        .update_wallet(&id, &identity.user_id, &req)
        .await?
        .ok_or_else(|| ServiceError::not_found("Wallet not found"))?;

    Ok(Json(wallet))
}

pub async fn remove(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let wallet = state
        .wallets
        .get_wallet(&id, &identity.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Wallet not found"))?;

    if state.wallets.transaction_count(&wallet.id).await? > 0 {
        return Err(ServiceError::bad_request(
            "Wallet still has transactions; delete them first",
        ));
    }

    state.wallets.delete_wallet(&wallet.id, &identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
