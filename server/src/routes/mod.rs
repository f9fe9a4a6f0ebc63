//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the OAuth endpoints, the JSON API, and the `/healthz`
//! check under a single Axum router. Public reads need no session; personal
//! data needs `AuthUser`; everything under `/api/admin` needs `AdminUser`.

pub mod auth;
pub mod blog;
pub mod profile;
pub mod subscriptions;
pub mod tools;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::services::error::StoreError;
use crate::state::AppState;

/// Error half of every JSON handler: status plus a plain-text message.
pub(crate) type ApiError = (StatusCode, String);

/// Map a service error to a response. Database failures are logged and
/// hidden, except a missing table, whose message is passed through so the
/// client can show a setup notice.
pub(crate) fn store_error_to_status(err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        StoreError::Invalid { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        StoreError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        StoreError::SchemaMissing(message) => {
            tracing::error!(%message, "schema missing; run migrations");
            (StatusCode::SERVICE_UNAVAILABLE, message)
        }
        StoreError::Database(e) => {
            tracing::error!(error = %e, "database error");
            (StatusCode::INTERNAL_SERVER_ERROR, "database error".to_owned())
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auth/{provider}", get(auth::provider_redirect))
        .route("/auth/{provider}/callback", get(auth::provider_callback))
        .route("/api/auth/session", get(auth::current_session))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/profile",
            get(profile::get_profile)
                .patch(profile::update_profile)
                .delete(profile::delete_profile),
        )
        .route(
            "/api/subscriptions",
            get(subscriptions::list_subscriptions).post(subscriptions::create_subscription),
        )
        .route(
            "/api/subscriptions/{id}",
            patch(subscriptions::update_subscription).delete(subscriptions::delete_subscription),
        )
        .route("/api/tags", get(blog::list_tags))
        .route("/api/blog/posts", get(blog::list_posts))
        .route("/api/blog/posts/{slug}", get(blog::get_post_by_slug))
        .route("/api/tools", get(tools::list_tools))
        .route("/api/categories", get(tools::list_categories))
        .route("/api/admin/tags", post(blog::create_tag))
        .route("/api/admin/blog/posts", get(blog::admin_list_posts).post(blog::create_post))
        .route(
            "/api/admin/blog/posts/{id}",
            get(blog::admin_get_post)
                .patch(blog::update_post)
                .delete(blog::delete_post),
        )
        .route("/api/admin/tools", post(tools::create_tool))
        .route("/api/admin/tools/{id}", patch(tools::update_tool).delete(tools::delete_tool))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
