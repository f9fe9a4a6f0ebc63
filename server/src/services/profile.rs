//! Profile service: read, rename, delete the caller's own profile.

use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{StoreError, required};

pub const MAX_USERNAME_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn profile_from_row(row: &PgRow) -> Profile {
    Profile {
        id: row.get("id"),
        email: row.get("email"),
        username: row.get("username"),
        avatar_url: row.get("avatar_url"),
        is_admin: row.get("is_admin"),
        created_at: row.get("created_at"),
    }
}

/// Trimmed, non-empty, at most [`MAX_USERNAME_CHARS`] characters.
///
/// # Errors
///
/// Returns [`StoreError::Invalid`] for blank or overlong names.
pub fn validate_username(raw: &str) -> Result<String, StoreError> {
    let username = required("username", raw)?;
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(StoreError::invalid("username", format!("at most {MAX_USERNAME_CHARS} characters")));
    }
    Ok(username)
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] if the profile is gone.
pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Profile, StoreError> {
    let row = sqlx::query("SELECT id, email, username, avatar_url, is_admin, created_at FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;
    Ok(profile_from_row(&row))
}

/// # Errors
///
/// Returns [`StoreError::Invalid`] for a bad username, or
/// [`StoreError::NotFound`] if the profile is gone.
pub async fn update_username(pool: &PgPool, user_id: Uuid, raw: &str) -> Result<Profile, StoreError> {
    let username = validate_username(raw)?;
    let row = sqlx::query(
        r"UPDATE profiles SET username = $2 WHERE id = $1
          RETURNING id, email, username, avatar_url, is_admin, created_at",
    )
    .bind(user_id)
    .bind(username)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)?;
    Ok(profile_from_row(&row))
}

/// Delete the profile; sessions and subscriptions cascade.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] if the profile is already gone.
pub async fn delete_profile(pool: &PgPool, user_id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM profiles WHERE id = $1").bind(user_id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
