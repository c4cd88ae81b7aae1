use axum::{extract::State, response::IntoResponse, Json};

use super::gate::CurrentUser;
use super::AppState;
use crate::services::ServiceError;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<impl IntoResponse, ServiceError> {
    let achievements = state.achievements.list_achievements(&identity.user_id).await?;

    Ok(Json(achievements))
}
