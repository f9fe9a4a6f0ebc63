//! Blog service: tags and posts.
//!
//! DESIGN
//! ======
//! Posts keep their tags as a `UUID[]` column rather than a join table;
//! the list is small and always read whole. Author details are joined in on
//! read so the public list needs one query.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{StoreError, optional, required};

const POST_SELECT: &str = r"
    SELECT p.id, p.title, p.slug, p.summary, p.content, p.thumbnail_url, p.author_id, p.tags, p.created_at,
           a.id AS author_profile_id, a.username AS author_username, a.avatar_url AS author_avatar_url
    FROM blog_posts p
    LEFT JOIN profiles a ON a.id = p.author_id";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagInput {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostAuthor {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub tags: Vec<Uuid>,
    pub author: Option<PostAuthor>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<Uuid>,
}

/// Validated post fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<Uuid>,
}

/// URL slug: lowercase, runs of anything outside `[a-z0-9가-힣]` become one
/// `-`, no leading or trailing `-`.
#[must_use]
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || ('가'..='힣').contains(&c) {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

impl PostInput {
    /// A blank slug is derived from the title.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<PostDraft, StoreError> {
        let title = required("title", &self.title)?;
        let slug = if self.slug.trim().is_empty() { slugify(&title) } else { slugify(&self.slug) };
        if slug.is_empty() {
            return Err(StoreError::invalid("slug", "must contain a letter or digit"));
        }
        let mut seen = std::collections::HashSet::new();
        let tags = self.tags.iter().copied().filter(|tag| seen.insert(*tag)).collect();
        Ok(PostDraft {
            title,
            slug,
            summary: self.summary.trim().to_owned(),
            content: self.content.clone(),
            thumbnail_url: optional(self.thumbnail_url.as_deref()),
            tags,
        })
    }
}

fn post_from_row(row: &PgRow) -> BlogPost {
    let author_profile_id: Option<Uuid> = row.get("author_profile_id");
    BlogPost {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        summary: row.get("summary"),
        content: row.get("content"),
        thumbnail_url: row.get("thumbnail_url"),
        author_id: row.get("author_id"),
        tags: row.get("tags"),
        author: author_profile_id
            .map(|_| PostAuthor { username: row.get("author_username"), avatar_url: row.get("author_avatar_url") }),
        created_at: row.get("created_at"),
    }
}

// =============================================================================
// TAGS
// =============================================================================

/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub async fn list_tags(pool: &PgPool) -> Result<Vec<Tag>, StoreError> {
    let rows = sqlx::query("SELECT id, name FROM tags ORDER BY name ASC").fetch_all(pool).await?;
    Ok(rows.iter().map(|r| Tag { id: r.get("id"), name: r.get("name") }).collect())
}

/// # Errors
///
/// Returns [`StoreError::Conflict`] if the name is taken.
pub async fn create_tag(pool: &PgPool, input: &TagInput) -> Result<Tag, StoreError> {
    let name = required("name", &input.name)?;
    let row = sqlx::query("INSERT INTO tags (name) VALUES ($1) RETURNING id, name")
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(Tag { id: row.get("id"), name: row.get("name") })
}

// =============================================================================
// POSTS
// =============================================================================

/// All posts, newest first.
///
/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub async fn list_posts(pool: &PgPool) -> Result<Vec<BlogPost>, StoreError> {
    let rows = sqlx::query(&format!("{POST_SELECT} ORDER BY p.created_at DESC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(post_from_row).collect())
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown slug.
pub async fn post_by_slug(pool: &PgPool, slug: &str) -> Result<BlogPost, StoreError> {
    let row = sqlx::query(&format!("{POST_SELECT} WHERE p.slug = $1"))
        .bind(slug)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;
    Ok(post_from_row(&row))
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown id.
pub async fn post_by_id(pool: &PgPool, id: Uuid) -> Result<BlogPost, StoreError> {
    let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(StoreError::NotFound)?;
    Ok(post_from_row(&row))
}

/// # Errors
///
/// Returns [`StoreError::Conflict`] if the slug is taken.
pub async fn create_post(pool: &PgPool, author_id: Uuid, draft: &PostDraft) -> Result<BlogPost, StoreError> {
    let row = sqlx::query(
        r"INSERT INTO blog_posts (title, slug, summary, content, thumbnail_url, author_id, tags)
          VALUES ($1, $2, $3, $4, $5, $6, $7)
          RETURNING id",
    )
    .bind(&draft.title)
    .bind(&draft.slug)
    .bind(&draft.summary)
    .bind(&draft.content)
    .bind(&draft.thumbnail_url)
    .bind(author_id)
    .bind(&draft.tags)
    .fetch_one(pool)
    .await?;
    post_by_id(pool, row.get("id")).await
}

/// The original author is kept.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown id or
/// [`StoreError::Conflict`] if the new slug is taken.
pub async fn update_post(pool: &PgPool, id: Uuid, draft: &PostDraft) -> Result<BlogPost, StoreError> {
    let result = sqlx::query(
        r"UPDATE blog_posts
          SET title = $2, slug = $3, summary = $4, content = $5, thumbnail_url = $6, tags = $7
          WHERE id = $1",
    )
    .bind(id)
    .bind(&draft.title)
    .bind(&draft.slug)
    .bind(&draft.summary)
    .bind(&draft.content)
    .bind(&draft.thumbnail_url)
    .bind(&draft.tags)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    post_by_id(pool, id).await
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] if nothing was deleted.
pub async fn delete_post(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM blog_posts WHERE id = $1").bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[path = "blog_test.rs"]
mod tests;
