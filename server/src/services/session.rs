//! Session issuance, validation, refresh, and revocation.
//!
//! ARCHITECTURE
//! ============
//! A session is an opaque access/refresh token pair bound to one profile.
//! Only SHA-256 hashes of the tokens are stored, so a leaked `sessions` table
//! cannot be replayed. The access token authenticates API calls for a short
//! window; the refresh token is exchanged once for a new pair.
//!
//! TRADE-OFFS
//! ==========
//! Refresh consumption is destructive (`DELETE ... RETURNING`) to guarantee
//! single use; a client that loses the rotated pair must sign in again. The
//! DELETE and the replacement INSERT share one transaction, so a failed
//! rotation leaves the old pair in place.

use std::fmt::Write;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

pub const DEFAULT_ACCESS_TTL_SECS: u64 = 60 * 60;
pub const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Hex SHA-256 of a token, as stored in `sessions`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    bytes_to_hex(&Sha256::digest(token.as_bytes()))
}

// =============================================================================
// TTL CONFIG
// =============================================================================

/// Token lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for SessionTtl {
    fn default() -> Self {
        Self { access: secs(DEFAULT_ACCESS_TTL_SECS), refresh: secs(DEFAULT_REFRESH_TTL_SECS) }
    }
}

impl SessionTtl {
    /// Load from `ACCESS_TOKEN_TTL_SECS` and `REFRESH_TOKEN_TTL_SECS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Zero, negative, or unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str, default: u64| {
            lookup(key)
                .and_then(|raw| raw.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self {
            access: secs(read("ACCESS_TOKEN_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)),
            refresh: secs(read("REFRESH_TOKEN_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)),
        }
    }
}

fn secs(value: u64) -> Duration {
    Duration::seconds(i64::try_from(value).unwrap_or(i64::MAX))
}

// =============================================================================
// TYPES
// =============================================================================

/// Identity attached to a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    /// Profile identifier.
    pub id: Uuid,
    pub email: Option<String>,
    /// OAuth provider that created the session (`github`, `google`, `kakao`).
    pub provider: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// A validated session, as seen by the auth extractors.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub user: SessionUser,
    pub is_admin: bool,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
}

/// Body of `GET /api/auth/session`. Tokens are never echoed back.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub user: SessionUser,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl From<ActiveSession> for SessionInfo {
    fn from(session: ActiveSession) -> Self {
        Self { user: session.user, issued_at: session.issued_at, expires_at: session.expires_at }
    }
}

/// Freshly minted token pair with its validity window.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: OffsetDateTime,
    pub expires_at: OffsetDateTime,
    pub refresh_expires_at: OffsetDateTime,
}

impl TokenPair {
    #[must_use]
    pub fn issue(now: OffsetDateTime, ttl: SessionTtl) -> Self {
        Self {
            access_token: generate_token(),
            refresh_token: generate_token(),
            issued_at: now,
            expires_at: now + ttl.access,
            refresh_expires_at: now + ttl.refresh,
        }
    }
}

/// A newly created session, returned to the caller exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

// =============================================================================
// QUERIES
// =============================================================================

fn user_from_row(row: &PgRow) -> SessionUser {
    SessionUser {
        id: row.get("id"),
        email: row.get("email"),
        provider: row.get("provider"),
        username: row.get("username"),
        avatar_url: row.get("avatar_url"),
    }
}

/// Create a session for `user_id`, returning the plaintext tokens.
///
/// # Errors
///
/// Returns a database error if the insert fails or the profile is gone.
pub async fn create_session(
    pool: &PgPool,
    user_id: Uuid,
    provider: &str,
    ttl: SessionTtl,
) -> Result<IssuedSession, sqlx::Error> {
    let mut conn = pool.acquire().await?;
    insert_session(&mut conn, user_id, provider, ttl).await
}

async fn insert_session(
    conn: &mut PgConnection,
    user_id: Uuid,
    provider: &str,
    ttl: SessionTtl,
) -> Result<IssuedSession, sqlx::Error> {
    let pair = TokenPair::issue(OffsetDateTime::now_utc(), ttl);
    sqlx::query(
        r"INSERT INTO sessions
              (access_token_hash, refresh_token_hash, user_id, provider, issued_at, expires_at, refresh_expires_at)
          VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(hash_token(&pair.access_token))
    .bind(hash_token(&pair.refresh_token))
    .bind(user_id)
    .bind(provider)
    .bind(pair.issued_at)
    .bind(pair.expires_at)
    .bind(pair.refresh_expires_at)
    .execute(&mut *conn)
    .await?;

    let row = sqlx::query("SELECT id, email, $2::text AS provider, username, avatar_url FROM profiles WHERE id = $1")
        .bind(user_id)
        .bind(provider)
        .fetch_one(&mut *conn)
        .await?;

    Ok(IssuedSession {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        user: user_from_row(&row),
        issued_at: pair.issued_at,
        expires_at: pair.expires_at,
    })
}

/// Validate an access token and return the session it belongs to.
///
/// # Errors
///
/// Returns a database error if the lookup fails.
pub async fn validate_session(pool: &PgPool, access_token: &str) -> Result<Option<ActiveSession>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT p.id, p.email, s.provider, p.username, p.avatar_url, p.is_admin, s.issued_at, s.expires_at
          FROM sessions s
          JOIN profiles p ON p.id = s.user_id
          WHERE s.access_token_hash = $1 AND s.expires_at > now()",
    )
    .bind(hash_token(access_token))
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| ActiveSession {
        user: user_from_row(&r),
        is_admin: r.get("is_admin"),
        issued_at: r.get("issued_at"),
        expires_at: r.get("expires_at"),
    }))
}

/// Consume a refresh token and issue a new pair for the same profile.
///
/// Returns `None` when the refresh token is unknown, already used, or expired.
///
/// # Errors
///
/// Returns a database error if the rotation fails.
pub async fn refresh_session(
    pool: &PgPool,
    refresh_token: &str,
    ttl: SessionTtl,
) -> Result<Option<IssuedSession>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let row = sqlx::query(
        r"DELETE FROM sessions
          WHERE refresh_token_hash = $1 AND refresh_expires_at > now()
          RETURNING user_id, provider",
    )
    .bind(hash_token(refresh_token))
    .fetch_optional(tx.as_mut())
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let user_id: Uuid = row.get("user_id");
    let provider: String = row.get("provider");
    // Dropping `tx` on error rolls the DELETE back, so the old pair stays usable.
    let issued = insert_session(tx.as_mut(), user_id, &provider, ttl).await?;
    tx.commit().await?;
    Ok(Some(issued))
}

/// Delete a session by access token.
///
/// # Errors
///
/// Returns a database error if the delete fails.
pub async fn delete_session(pool: &PgPool, access_token: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE access_token_hash = $1")
        .bind(hash_token(access_token))
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
