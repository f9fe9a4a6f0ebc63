//! OAuth sign-in service: provider config, code exchange, identity fetch,
//! profile upsert.
//!
//! DESIGN
//! ======
//! GitHub, Google, and Kakao all run the plain authorization-code flow; they
//! differ only in endpoints, scopes, and the shape of their user-info JSON.
//! `OAuthProvider` carries the endpoint table and `parse_user` normalizes the
//! user-info body into one `ProviderUser`, so the route layer never branches
//! on the provider.

use std::collections::HashMap;

use sqlx::{PgPool, Row};
use uuid::Uuid;

// =============================================================================
// PROVIDERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    GitHub,
    Google,
    Kakao,
}

impl OAuthProvider {
    pub const ALL: [Self; 3] = [Self::GitHub, Self::Google, Self::Kakao];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::Google => "google",
            Self::Kakao => "kakao",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == raw)
    }

    fn env_prefix(self) -> &'static str {
        match self {
            Self::GitHub => "GITHUB",
            Self::Google => "GOOGLE",
            Self::Kakao => "KAKAO",
        }
    }

    fn authorize_endpoint(self) -> &'static str {
        match self {
            Self::GitHub => "https://github.com/login/oauth/authorize",
            Self::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            Self::Kakao => "https://kauth.kakao.com/oauth/authorize",
        }
    }

    fn token_endpoint(self) -> &'static str {
        match self {
            Self::GitHub => "https://github.com/login/oauth/access_token",
            Self::Google => "https://oauth2.googleapis.com/token",
            Self::Kakao => "https://kauth.kakao.com/oauth/token",
        }
    }

    fn userinfo_endpoint(self) -> &'static str {
        match self {
            Self::GitHub => "https://api.github.com/user",
            Self::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            Self::Kakao => "https://kapi.kakao.com/v2/user/me",
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Self::GitHub => "read:user user:email",
            Self::Google => "openid email profile",
            Self::Kakao => "profile_nickname profile_image account_email",
        }
    }
}

impl std::fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OAuth client credentials for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider: OAuthProvider,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl ProviderConfig {
    /// Load `{PROVIDER}_CLIENT_ID` and `{PROVIDER}_CLIENT_SECRET`.
    /// Returns `None` if either is missing (that provider is disabled).
    #[must_use]
    pub fn from_lookup(
        provider: OAuthProvider,
        public_base_url: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let prefix = provider.env_prefix();
        let client_id = lookup(&format!("{prefix}_CLIENT_ID")).filter(|v| !v.trim().is_empty())?;
        let client_secret = lookup(&format!("{prefix}_CLIENT_SECRET")).filter(|v| !v.trim().is_empty())?;
        let redirect_uri = format!("{}/auth/{provider}/callback", public_base_url.trim_end_matches('/'));
        Some(Self { provider, client_id, client_secret, redirect_uri })
    }

    /// Build the provider authorization URL carrying the CSRF `state`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if the URL cannot be assembled.
    pub fn authorize_url(&self, state: &str) -> Result<String, AuthError> {
        reqwest::Url::parse_with_params(
            self.provider.authorize_endpoint(),
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.provider.scope()),
                ("state", state),
            ],
        )
        .map(String::from)
        .map_err(|e| AuthError::Config(e.to_string()))
    }
}

/// Every provider with credentials configured, keyed by provider.
#[must_use]
pub fn providers_from_lookup(
    public_base_url: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> HashMap<OAuthProvider, ProviderConfig> {
    OAuthProvider::ALL
        .into_iter()
        .filter_map(|p| ProviderConfig::from_lookup(p, public_base_url, &lookup).map(|c| (p, c)))
        .collect()
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("oauth config error: {0}")]
    Config(String),
    #[error("{provider} token exchange failed: {message}")]
    TokenExchange { provider: OAuthProvider, message: String },
    #[error("{provider} user api error: {message}")]
    UserInfo { provider: OAuthProvider, message: String },
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl AuthError {
    /// Short code surfaced to the sign-in page as `?error=`.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "provider_unavailable",
            Self::TokenExchange { .. } => "token_exchange_failed",
            Self::UserInfo { .. } => "profile_fetch_failed",
            Self::Db(_) => "server_error",
        }
    }
}

// =============================================================================
// CODE EXCHANGE
// =============================================================================

#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange an OAuth code for a provider access token.
///
/// # Errors
///
/// Returns [`AuthError::TokenExchange`] on transport failure or an
/// unexpected response body.
pub async fn exchange_code(http: &reqwest::Client, config: &ProviderConfig, code: &str) -> Result<String, AuthError> {
    let provider = config.provider;
    let fail = |message: String| AuthError::TokenExchange { provider, message };

    let resp = http
        .post(provider.token_endpoint())
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;

    let body = resp.text().await.map_err(|e| fail(e.to_string()))?;
    let token: TokenResponse =
        serde_json::from_str(&body).map_err(|_| fail(format!("unexpected response: {body}")))?;
    Ok(token.access_token)
}

// =============================================================================
// USER INFO
// =============================================================================

/// Provider identity, normalized across providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderUser {
    pub provider: OAuthProvider,
    /// Stable provider-side account id, stringified.
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub preferred_username: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProviderUser {
    /// Display name for a new profile: name, then user name, then preferred
    /// username, then the local part of the email.
    #[must_use]
    pub fn fallback_username(&self) -> Option<String> {
        [&self.name, &self.user_name, &self.preferred_username]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_owned)
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_owned)
            })
    }
}

fn str_at(value: &serde_json::Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(serde_json::Value::as_str).map(str::to_owned)
}

fn id_at(value: &serde_json::Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Normalize a provider user-info body.
///
/// # Errors
///
/// Returns [`AuthError::UserInfo`] if the body carries no account id.
pub fn parse_user(provider: OAuthProvider, body: &serde_json::Value) -> Result<ProviderUser, AuthError> {
    let id_pointer = match provider {
        OAuthProvider::GitHub | OAuthProvider::Kakao => "/id",
        OAuthProvider::Google => "/sub",
    };
    let id = id_at(body, id_pointer)
        .ok_or_else(|| AuthError::UserInfo { provider, message: "response has no account id".into() })?;

    let user = match provider {
        OAuthProvider::GitHub => ProviderUser {
            provider,
            id,
            email: str_at(body, "/email"),
            name: str_at(body, "/name"),
            user_name: str_at(body, "/login"),
            preferred_username: None,
            avatar_url: str_at(body, "/avatar_url"),
        },
        OAuthProvider::Google => ProviderUser {
            provider,
            id,
            email: str_at(body, "/email"),
            name: str_at(body, "/name"),
            user_name: None,
            preferred_username: str_at(body, "/given_name"),
            avatar_url: str_at(body, "/picture"),
        },
        OAuthProvider::Kakao => ProviderUser {
            provider,
            id,
            email: str_at(body, "/kakao_account/email"),
            name: str_at(body, "/kakao_account/profile/nickname"),
            user_name: None,
            preferred_username: str_at(body, "/properties/nickname"),
            avatar_url: str_at(body, "/kakao_account/profile/profile_image_url"),
        },
    };
    Ok(user)
}

/// Fetch the signed-in account from the provider's user-info endpoint.
///
/// # Errors
///
/// Returns [`AuthError::UserInfo`] on transport failure, a non-2xx status,
/// or a body without an account id.
pub async fn fetch_user(
    http: &reqwest::Client,
    provider: OAuthProvider,
    access_token: &str,
) -> Result<ProviderUser, AuthError> {
    let fail = |message: String| AuthError::UserInfo { provider, message };

    let resp = http
        .get(provider.userinfo_endpoint())
        .bearer_auth(access_token)
        .header("User-Agent", "chekyoursub")
        .send()
        .await
        .map_err(|e| fail(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(fail(format!("{status}: {body}")));
    }

    let body: serde_json::Value = resp.json().await.map_err(|e| fail(e.to_string()))?;
    parse_user(provider, &body)
}

// =============================================================================
// PROFILE UPSERT
// =============================================================================

/// Find or create the profile for a provider account. Returns its UUID.
///
/// New profiles start with `is_admin = false`. On repeat sign-in the email
/// and avatar are refreshed; the username is left alone so renames stick.
///
/// # Errors
///
/// Returns [`AuthError::Db`] if the upsert fails.
pub async fn upsert_profile(pool: &PgPool, user: &ProviderUser) -> Result<Uuid, AuthError> {
    let row = sqlx::query(
        r"INSERT INTO profiles (provider, provider_user_id, email, username, avatar_url)
          VALUES ($1, $2, $3, $4, $5)
          ON CONFLICT (provider, provider_user_id)
          DO UPDATE SET email = EXCLUDED.email, avatar_url = EXCLUDED.avatar_url
          RETURNING id",
    )
    .bind(user.provider.as_str())
    .bind(&user.id)
    .bind(&user.email)
    .bind(user.fallback_username())
    .bind(&user.avatar_url)
    .fetch_one(pool)
    .await?;
    Ok(row.get("id"))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
