//! REST client for the data-store and identity endpoints.
//!
//! DESIGN
//! ======
//! `DataStore` is the seam page controllers depend on; `ApiClient` is the
//! HTTP implementation. Every call that touches user data takes the
//! `Session` explicitly so nothing here reads auth state on its own.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `ApiError` values carrying the status and the
//! server's message. Callers turn those into notices; nothing panics.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use super::types::{
    AiTool, BlogPost, Category, Credential, PostDraft, Profile, Session, SessionInfo, Subscription,
    SubscriptionDraft, Tag, ToolDraft,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("not signed in")]
    Unauthorized,
    #[error("permission denied")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// True when the backing table has not been provisioned yet.
    #[must_use]
    pub fn is_schema_missing(&self) -> bool {
        match self {
            Self::Status { message, .. } => message.contains("relation") && message.contains("does not exist"),
            _ => false,
        }
    }
}

pub(crate) fn status_error(status: u16, message: String) -> ApiError {
    match status {
        401 => ApiError::Unauthorized,
        403 => ApiError::Forbidden,
        404 => ApiError::NotFound,
        _ => ApiError::Status { status, message },
    }
}

// =============================================================================
// DATA STORE SEAM
// =============================================================================

/// CRUD over the six collections. Public reads take no session.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn profile(&self, session: &Session) -> Result<Profile, ApiError>;
    async fn update_username(&self, session: &Session, username: &str) -> Result<Profile, ApiError>;
    async fn delete_profile(&self, session: &Session) -> Result<(), ApiError>;

    async fn list_subscriptions(&self, session: &Session) -> Result<Vec<Subscription>, ApiError>;
    async fn create_subscription(&self, session: &Session, draft: &SubscriptionDraft) -> Result<Subscription, ApiError>;
    async fn update_subscription(
        &self,
        session: &Session,
        id: Uuid,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, ApiError>;
    async fn delete_subscription(&self, session: &Session, id: Uuid) -> Result<(), ApiError>;

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError>;
    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError>;
    async fn post_by_slug(&self, slug: &str) -> Result<BlogPost, ApiError>;
    async fn admin_post(&self, session: &Session, id: Uuid) -> Result<BlogPost, ApiError>;
    async fn create_post(&self, session: &Session, draft: &PostDraft) -> Result<BlogPost, ApiError>;
    async fn update_post(&self, session: &Session, id: Uuid, draft: &PostDraft) -> Result<BlogPost, ApiError>;
    async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), ApiError>;

    async fn list_tools(&self) -> Result<Vec<AiTool>, ApiError>;
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;
    async fn create_tool(&self, session: &Session, draft: &ToolDraft) -> Result<AiTool, ApiError>;
    async fn update_tool(&self, session: &Session, id: Uuid, draft: &ToolDraft) -> Result<AiTool, ApiError>;
    async fn delete_tool(&self, session: &Session, id: Uuid) -> Result<(), ApiError>;
}

/// Admin-flag lookup used by admin-only views.
#[async_trait]
pub trait RoleLookup: Send + Sync {
    async fn is_admin(&self, session: &Session) -> Result<bool, ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Server route that starts the OAuth flow for `provider`.
#[must_use]
pub fn sign_in_url(base_url: &str, provider: &str) -> String {
    endpoint(base_url, &format!("/auth/{provider}"))
}

/// URL of one post, with `slug` percent-encoded as a single path segment.
fn post_slug_url(base_url: &str, slug: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(&endpoint(base_url, "/api/blog/posts"))
        .map_err(|e| ApiError::Transport(format!("invalid base URL {base_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|()| ApiError::Transport(format!("base URL cannot carry a path: {base_url}")))?
        .push(slug);
    Ok(url)
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Browser URL that starts the OAuth flow for `provider`.
    #[must_use]
    pub fn sign_in_url(&self, provider: &str) -> String {
        sign_in_url(&self.base_url, provider)
    }

    /// `GET /healthz`.
    pub async fn health(&self) -> Result<(), ApiError> {
        Self::send_empty(self.request(Method::GET, "/healthz")).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, endpoint(&self.base_url, path))
    }

    fn authed(&self, method: Method, path: &str, session: &Session) -> RequestBuilder {
        self.request(method, path).bearer_auth(&session.access_token)
    }

    async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(status_error(status.as_u16(), message));
        }
        resp.json::<T>().await.map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_empty(req: RequestBuilder) -> Result<(), ApiError> {
        let resp = req.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let message = resp.text().await.unwrap_or_default();
        Err(status_error(status.as_u16(), message))
    }

    fn with_body<B: Serialize + ?Sized>(req: RequestBuilder, body: &B) -> RequestBuilder {
        req.json(body)
    }

    // -------------------------------------------------------------------------
    // Identity endpoints (used by the HTTP identity provider)
    // -------------------------------------------------------------------------

    /// `GET /api/auth/session` with the stored access token.
    ///
    /// Returns `Ok(None)` when the server no longer recognizes the token.
    pub async fn session_info(&self, credential: &Credential) -> Result<Option<SessionInfo>, ApiError> {
        let req = self.request(Method::GET, "/api/auth/session").bearer_auth(&credential.access_token);
        match Self::send::<SessionInfo>(req).await {
            Ok(info) => Ok(Some(info)),
            Err(ApiError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /api/auth/refresh`, rotating both tokens.
    pub async fn refresh(&self, credential: &Credential) -> Result<Option<Session>, ApiError> {
        let req = self
            .request(Method::POST, "/api/auth/refresh")
            .json(&serde_json::json!({ "refresh_token": credential.refresh_token }));
        match Self::send::<Session>(req).await {
            Ok(session) => Ok(Some(session)),
            Err(ApiError::Unauthorized) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// `POST /api/auth/logout`.
    pub async fn logout(&self, session: &Session) -> Result<(), ApiError> {
        let resp = self
            .authed(Method::POST, "/api/auth/logout", session)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        // An already-dead session is as good as a successful logout.
        if resp.status().is_success() || resp.status() == StatusCode::UNAUTHORIZED {
            return Ok(());
        }
        let status = resp.status().as_u16();
        Err(status_error(status, resp.text().await.unwrap_or_default()))
    }
}

#[async_trait]
impl DataStore for ApiClient {
    async fn profile(&self, session: &Session) -> Result<Profile, ApiError> {
        Self::send(self.authed(Method::GET, "/api/profile", session)).await
    }

    async fn update_username(&self, session: &Session, username: &str) -> Result<Profile, ApiError> {
        let req = self.authed(Method::PATCH, "/api/profile", session);
        Self::send(Self::with_body(req, &serde_json::json!({ "username": username }))).await
    }

    async fn delete_profile(&self, session: &Session) -> Result<(), ApiError> {
        Self::send_empty(self.authed(Method::DELETE, "/api/profile", session)).await
    }

    async fn list_subscriptions(&self, session: &Session) -> Result<Vec<Subscription>, ApiError> {
        Self::send(self.authed(Method::GET, "/api/subscriptions", session)).await
    }

    async fn create_subscription(&self, session: &Session, draft: &SubscriptionDraft) -> Result<Subscription, ApiError> {
        let req = self.authed(Method::POST, "/api/subscriptions", session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn update_subscription(
        &self,
        session: &Session,
        id: Uuid,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, ApiError> {
        let req = self.authed(Method::PATCH, &format!("/api/subscriptions/{id}"), session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn delete_subscription(&self, session: &Session, id: Uuid) -> Result<(), ApiError> {
        Self::send_empty(self.authed(Method::DELETE, &format!("/api/subscriptions/{id}"), session)).await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        Self::send(self.request(Method::GET, "/api/tags")).await
    }

    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        Self::send(self.request(Method::GET, "/api/blog/posts")).await
    }

    async fn post_by_slug(&self, slug: &str) -> Result<BlogPost, ApiError> {
        let url = post_slug_url(&self.base_url, slug)?;
        Self::send(self.http.get(url)).await
    }

    async fn admin_post(&self, session: &Session, id: Uuid) -> Result<BlogPost, ApiError> {
        Self::send(self.authed(Method::GET, &format!("/api/admin/blog/posts/{id}"), session)).await
    }

    async fn create_post(&self, session: &Session, draft: &PostDraft) -> Result<BlogPost, ApiError> {
        let req = self.authed(Method::POST, "/api/admin/blog/posts", session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn update_post(&self, session: &Session, id: Uuid, draft: &PostDraft) -> Result<BlogPost, ApiError> {
        let req = self.authed(Method::PATCH, &format!("/api/admin/blog/posts/{id}"), session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn delete_post(&self, session: &Session, id: Uuid) -> Result<(), ApiError> {
        Self::send_empty(self.authed(Method::DELETE, &format!("/api/admin/blog/posts/{id}"), session)).await
    }

    async fn list_tools(&self) -> Result<Vec<AiTool>, ApiError> {
        Self::send(self.request(Method::GET, "/api/tools")).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Self::send(self.request(Method::GET, "/api/categories")).await
    }

    async fn create_tool(&self, session: &Session, draft: &ToolDraft) -> Result<AiTool, ApiError> {
        let req = self.authed(Method::POST, "/api/admin/tools", session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn update_tool(&self, session: &Session, id: Uuid, draft: &ToolDraft) -> Result<AiTool, ApiError> {
        let req = self.authed(Method::PATCH, &format!("/api/admin/tools/{id}"), session);
        Self::send(Self::with_body(req, draft)).await
    }

    async fn delete_tool(&self, session: &Session, id: Uuid) -> Result<(), ApiError> {
        Self::send_empty(self.authed(Method::DELETE, &format!("/api/admin/tools/{id}"), session)).await
    }
}

#[async_trait]
impl RoleLookup for ApiClient {
    async fn is_admin(&self, session: &Session) -> Result<bool, ApiError> {
        self.profile(session).await.map(|profile| profile.is_admin)
    }
}
