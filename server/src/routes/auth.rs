//! Auth routes: OAuth sign-in flow, session lookup, refresh, logout.
//!
//! ARCHITECTURE
//! ============
//! Browsers authenticate with the `session_token` cookie; API clients send
//! `Authorization: Bearer <access token>`. Both resolve through the same
//! `AuthUser` extractor, so handlers never care which one was used.
//!
//! A successful callback redirects to `/dashboard` with the token pair in the
//! URL fragment as well as in cookies. Fragments never reach the server, so
//! this hands the pair to non-browser clients without logging it anywhere.

use axum::body::Bytes;
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::services::auth::{self as auth_svc, AuthError, OAuthProvider};
use crate::services::session::{self, ActiveSession, IssuedSession, SessionInfo};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "session_token";
pub(crate) const REFRESH_COOKIE_NAME: &str = "refresh_token";
const OAUTH_STATE_COOKIE_NAME: &str = "oauth_state";

fn cookie(name: &'static str, value: String, path: &'static str, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path(path)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn session_cookies(jar: CookieJar, issued: &IssuedSession, state: &AppState) -> CookieJar {
    let secure = state.cookie_secure;
    jar.add(cookie(COOKIE_NAME, issued.access_token.clone(), "/", state.session_ttl.access, secure))
        .add(cookie(REFRESH_COOKIE_NAME, issued.refresh_token.clone(), "/api/auth", state.session_ttl.refresh, secure))
}

fn clear_session_cookies(jar: CookieJar, state: &AppState) -> CookieJar {
    let secure = state.cookie_secure;
    jar.add(cookie(COOKIE_NAME, String::new(), "/", Duration::ZERO, secure))
        .add(cookie(REFRESH_COOKIE_NAME, String::new(), "/api/auth", Duration::ZERO, secure))
}

/// Where a failed sign-in lands. Codes are reduced to `[a-z0-9_]` so a
/// provider-supplied value cannot inject into the URL.
pub(crate) fn auth_error_redirect(code: &str) -> Redirect {
    let safe: String = code
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .take(64)
        .collect();
    let safe = if safe.is_empty() { "oauth_failed" } else { safe.as_str() };
    Redirect::temporary(&format!("/auth?error={safe}"))
}

pub(crate) fn dashboard_redirect(issued: &IssuedSession) -> Redirect {
    Redirect::temporary(&format!(
        "/dashboard#access_token={}&refresh_token={}",
        issued.access_token, issued.refresh_token
    ))
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

/// Access token from `Authorization: Bearer`, else from the session cookie.
pub(crate) fn request_token(parts: &Parts) -> Option<String> {
    let bearer = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_owned());
    }
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty()).map(str::to_owned)
}

/// Authenticated user. Use as a handler parameter to require a session.
pub struct AuthUser {
    pub session: ActiveSession,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = request_token(parts).ok_or(StatusCode::UNAUTHORIZED)?;

        let app_state = AppState::from_ref(state);
        let session = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { session, token })
    }
}

/// Authenticated admin. Rejects with 401 without a session and 403 for
/// anyone whose profile is not flagged `is_admin`.
pub struct AdminUser(pub AuthUser);

impl<S> axum::extract::FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth = AuthUser::from_request_parts(parts, state).await?;
        if !auth.session.is_admin {
            tracing::warn!(user_id = %auth.session.user.id, "non-admin rejected from admin route");
            return Err(StatusCode::FORBIDDEN);
        }
        Ok(Self(auth))
    }
}

// =============================================================================
// OAUTH FLOW
// =============================================================================

/// `GET /auth/{provider}`: redirect to the provider's authorization page.
pub async fn provider_redirect(State(state): State<AppState>, Path(provider): Path<String>) -> Response {
    let Some(provider) = OAuthProvider::parse(&provider) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(config) = state.provider(provider) else {
        return (StatusCode::SERVICE_UNAVAILABLE, format!("{provider} sign-in not configured")).into_response();
    };

    let oauth_state = session::generate_token();
    let url = match config.authorize_url(&oauth_state) {
        Ok(url) => url,
        Err(e) => {
            tracing::error!(error = %e, %provider, "authorize url build failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let secure = state.cookie_secure;
    let jar = CookieJar::new().add(cookie(OAUTH_STATE_COOKIE_NAME, oauth_state, "/", Duration::minutes(10), secure));
    (jar, Redirect::temporary(&url)).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// `GET /auth/{provider}/callback`: exchange code, upsert profile, create
/// session, redirect to `/dashboard`. Every failure lands on
/// `/auth?error=<code>`.
pub async fn provider_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    let Some(provider) = OAuthProvider::parse(&provider) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let secure = state.cookie_secure;
    let expected_state = jar.get(OAUTH_STATE_COOKIE_NAME).map(|c| c.value().to_owned()).unwrap_or_default();
    let jar = jar.add(cookie(OAUTH_STATE_COOKIE_NAME, String::new(), "/", Duration::ZERO, secure));

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(%provider, error, "provider returned an error");
        return (jar, auth_error_redirect(error)).into_response();
    }
    let Some(config) = state.provider(provider) else {
        return (jar, auth_error_redirect("provider_unavailable")).into_response();
    };
    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return (jar, auth_error_redirect("missing_code")).into_response();
    };
    if expected_state.is_empty() || params.state.as_deref() != Some(expected_state.as_str()) {
        tracing::warn!(%provider, "oauth state mismatch");
        return (jar, auth_error_redirect("invalid_state")).into_response();
    }

    match complete_sign_in(&state, config, code).await {
        Ok(issued) => {
            tracing::info!(%provider, user_id = %issued.user.id, "signed in");
            let jar = session_cookies(jar, &issued, &state);
            (jar, dashboard_redirect(&issued)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, %provider, "sign-in failed");
            (jar, auth_error_redirect(e.code())).into_response()
        }
    }
}

async fn complete_sign_in(
    state: &AppState,
    config: &auth_svc::ProviderConfig,
    code: &str,
) -> Result<IssuedSession, AuthError> {
    let access_token = auth_svc::exchange_code(&state.http, config, code).await?;
    let user = auth_svc::fetch_user(&state.http, config.provider, &access_token).await?;
    let user_id = auth_svc::upsert_profile(&state.pool, &user).await?;
    let issued = session::create_session(&state.pool, user_id, config.provider.as_str(), state.session_ttl).await?;
    Ok(issued)
}

// =============================================================================
// SESSION API
// =============================================================================

/// `GET /api/auth/session`: the caller's current session.
pub async fn current_session(auth: AuthUser) -> Json<SessionInfo> {
    Json(auth.session.into())
}

#[derive(Debug, Deserialize)]
pub(crate) struct RefreshBody {
    pub refresh_token: String,
}

/// Refresh token from a JSON body, else from the refresh cookie.
pub(crate) fn refresh_token_from(body: &[u8], jar: &CookieJar) -> Option<String> {
    if !body.iter().all(u8::is_ascii_whitespace) {
        return serde_json::from_slice::<RefreshBody>(body)
            .ok()
            .map(|b| b.refresh_token)
            .filter(|t| !t.trim().is_empty());
    }
    jar.get(REFRESH_COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty()).map(str::to_owned)
}

/// `POST /api/auth/refresh`: rotate the token pair.
pub async fn refresh(State(state): State<AppState>, jar: CookieJar, body: Bytes) -> Response {
    let Some(refresh_token) = refresh_token_from(&body, &jar) else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    match session::refresh_session(&state.pool, &refresh_token, state.session_ttl).await {
        Ok(Some(issued)) => {
            tracing::debug!(user_id = %issued.user.id, "session refreshed");
            let jar = session_cookies(jar, &issued, &state);
            (jar, Json(issued)).into_response()
        }
        Ok(None) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "session refresh failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /api/auth/logout`: delete session, clear cookies.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }
    tracing::info!(user_id = %auth.session.user.id, "signed out");
    (clear_session_cookies(CookieJar::new(), &state), StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
