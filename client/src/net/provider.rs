//! Identity-provider seam for the auth store.
//!
//! SYSTEM CONTEXT
//! ==============
//! The store never talks HTTP directly. It hands the persisted credential to
//! an `IdentityProvider`, which either restores a live session, reports that
//! none exists, or fails with a provider error. The same seam renews a
//! session shortly before its access token expires.

use async_trait::async_trait;
use tracing::debug;

use super::api::{ApiClient, ApiError};
use super::types::{Credential, Session};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),
    #[error("identity provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("identity provider sent an unreadable response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Stable short code for display and logging.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "E_PROVIDER_UNREACHABLE",
            Self::Rejected { .. } => "E_PROVIDER_REJECTED",
            Self::Malformed(_) => "E_PROVIDER_MALFORMED",
        }
    }
}

impl From<ApiError> for ProviderError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Transport(msg) => Self::Unreachable(msg),
            ApiError::Decode(msg) => Self::Malformed(msg),
            ApiError::Unauthorized => Self::Rejected { status: 401, message: "unauthorized".into() },
            ApiError::Forbidden => Self::Rejected { status: 403, message: "forbidden".into() },
            ApiError::NotFound => Self::Rejected { status: 404, message: "not found".into() },
            ApiError::Status { status, message } => Self::Rejected { status, message },
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Turn a persisted credential (if any) into a live session.
    async fn restore(&self, credential: Option<&Credential>) -> Result<Option<Session>, ProviderError>;

    /// Exchange the session's refresh token for a new pair. `Ok(None)` means
    /// the provider no longer honors it.
    async fn refresh(&self, session: &Session) -> Result<Option<Session>, ProviderError>;

    /// Invalidate the session on the provider side.
    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError>;
}

/// Identity provider backed by the app server's `/api/auth/*` endpoints.
#[derive(Clone, Debug)]
pub struct HttpIdentityProvider {
    api: ApiClient,
}

impl HttpIdentityProvider {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn restore(&self, credential: Option<&Credential>) -> Result<Option<Session>, ProviderError> {
        let Some(credential) = credential else {
            return Ok(None);
        };

        if let Some(info) = self.api.session_info(credential).await? {
            return Ok(Some(info.into_session(credential.clone())));
        }

        debug!("access token rejected; trying refresh");
        Ok(self.api.refresh(credential).await?)
    }

    async fn refresh(&self, session: &Session) -> Result<Option<Session>, ProviderError> {
        Ok(self.api.refresh(&session.credential()).await?)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError> {
        self.api.logout(session).await.map_err(ProviderError::from)
    }
}
