use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use super::gate::CurrentUser;
use super::AppState;
use crate::models::users::{
    LoginRequest, LogoutAllRequest, RefreshRequest, RegisterRequest, TotpDisableRequest,
};
use crate::services::ServiceError;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tokens = state.accounts.register(&req).await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tokens = state.accounts.login(&req).await?;

    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tokens = state.accounts.refresh(&req.refresh_token).await?;

    Ok(Json(tokens))
}

pub async fn logout_all(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<LogoutAllRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .accounts
        .logout_all_devices(&identity.user_id, &req.password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn totp_setup(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let setup = state.accounts.totp_setup(&identity.user_id).await?;

    Ok(Json(setup))
}

pub async fn totp_disable(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Json(req): Json<TotpDisableRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .accounts
        .totp_disable(&identity.user_id, &req.totp_code)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
