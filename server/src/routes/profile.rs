//! Profile routes: the caller's own profile.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;

use super::auth::AuthUser;
use super::{ApiError, store_error_to_status};
use crate::services::profile::{self, Profile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileBody {
    pub username: String,
}

/// `GET /api/profile`
pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Profile>, ApiError> {
    profile::get_profile(&state.pool, auth.session.user.id)
        .await
        .map(Json)
        .map_err(store_error_to_status)
}

/// `PATCH /api/profile`: rename.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<Profile>, ApiError> {
    profile::update_username(&state.pool, auth.session.user.id, &body.username)
        .await
        .map(Json)
        .map_err(store_error_to_status)
}

/// `DELETE /api/profile`: delete the account. Sessions cascade, so the
/// token used for this request is dead afterwards.
pub async fn delete_profile(State(state): State<AppState>, auth: AuthUser) -> Result<StatusCode, ApiError> {
    let user_id = auth.session.user.id;
    profile::delete_profile(&state.pool, user_id)
        .await
        .map_err(store_error_to_status)?;
    tracing::info!(%user_id, "account deleted");
    Ok(StatusCode::NO_CONTENT)
}
