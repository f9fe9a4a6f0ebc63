//! Blog routes: public reads plus admin editing.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::auth::AdminUser;
use super::{ApiError, store_error_to_status};
use crate::services::blog::{self, BlogPost, PostInput, Tag, TagInput};
use crate::state::AppState;

/// `GET /api/tags`
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    blog::list_tags(&state.pool).await.map(Json).map_err(store_error_to_status)
}

/// `GET /api/blog/posts`: newest first.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<BlogPost>>, ApiError> {
    blog::list_posts(&state.pool).await.map(Json).map_err(store_error_to_status)
}

/// `GET /api/blog/posts/{slug}`
pub async fn get_post_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, ApiError> {
    blog::post_by_slug(&state.pool, &slug).await.map(Json).map_err(store_error_to_status)
}

/// `POST /api/admin/tags`
pub async fn create_tag(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(body): Json<TagInput>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = blog::create_tag(&state.pool, &body).await.map_err(store_error_to_status)?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// `GET /api/admin/blog/posts`
pub async fn admin_list_posts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<BlogPost>>, ApiError> {
    blog::list_posts(&state.pool).await.map(Json).map_err(store_error_to_status)
}

/// `GET /api/admin/blog/posts/{id}`
pub async fn admin_get_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<BlogPost>, ApiError> {
    blog::post_by_id(&state.pool, id).await.map(Json).map_err(store_error_to_status)
}

/// `POST /api/admin/blog/posts`: the admin becomes the author.
pub async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<PostInput>,
) -> Result<(StatusCode, Json<BlogPost>), ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    let post = blog::create_post(&state.pool, admin.session.user.id, &draft)
        .await
        .map_err(store_error_to_status)?;
    tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
    Ok((StatusCode::CREATED, Json(post)))
}

/// `PATCH /api/admin/blog/posts/{id}`
pub async fn update_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<PostInput>,
) -> Result<Json<BlogPost>, ApiError> {
    let draft = body.validate().map_err(store_error_to_status)?;
    blog::update_post(&state.pool, id, &draft).await.map(Json).map_err(store_error_to_status)
}

/// `DELETE /api/admin/blog/posts/{id}`
pub async fn delete_post(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    blog::delete_post(&state.pool, id).await.map_err(store_error_to_status)?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}
