//! Subscription routes, scoped to the caller.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::{ApiError, store_error_to_status};
use crate::services::subscription::{self, Subscription, SubscriptionInput};
use crate::state::AppState;

/// `GET /api/subscriptions`: soonest payment first.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Subscription>>, ApiError> {
    subscription::list_subscriptions(&state.pool, auth.session.user.id)
        .await
        .map(Json)
        .map_err(store_error_to_status)
}

/// `POST /api/subscriptions`
pub async fn create_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<SubscriptionInput>,
) -> Result<(StatusCode, Json<Subscription>), ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    let created = subscription::create_subscription(&state.pool, auth.session.user.id, &draft)
        .await
        .map_err(store_error_to_status)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `PATCH /api/subscriptions/{id}`
pub async fn update_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SubscriptionInput>,
) -> Result<Json<Subscription>, ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    subscription::update_subscription(&state.pool, auth.session.user.id, id, &draft)
        .await
        .map(Json)
        .map_err(store_error_to_status)
}

/// `DELETE /api/subscriptions/{id}`
pub async fn delete_subscription(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    subscription::delete_subscription(&state.pool, auth.session.user.id, id)
        .await
        .map_err(store_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}
