//! AI tools catalog routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AdminUser;
use super::{ApiError, store_error_to_status};
use crate::services::tools::{self, AiTool, Category, ToolInput};
use crate::state::AppState;

/// `GET /api/tools`: ordered by name.
pub async fn list_tools(State(state): State<AppState>) -> Result<Json<Vec<AiTool>>, ApiError> {
    tools::list_tools(&state.pool).await.map(Json).map_err(store_error_to_status)
}

/// `GET /api/categories`: ordered by name.
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    tools::list_categories(&state.pool).await.map(Json).map_err(store_error_to_status)
}

/// `POST /api/admin/tools`
pub async fn create_tool(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<ToolInput>,
) -> Result<(StatusCode, Json<AiTool>), ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    let tool = tools::create_tool(&state.pool, &draft).await.map_err(store_error_to_status)?;
    Ok((StatusCode::CREATED, Json(tool)))
}

/// `PATCH /api/admin/tools/{id}`
pub async fn update_tool(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ToolInput>,
) -> Result<Json<AiTool>, ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    tools::update_tool(&state.pool, id, &draft).await.map(Json).map_err(store_error_to_status)
}

/// `DELETE /api/admin/tools/{id}`
pub async fn delete_tool(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    tools::delete_tool(&state.pool, id).await.map_err(store_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}
