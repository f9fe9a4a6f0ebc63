//! AI tools catalog service: categories and tools.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::{StoreError, optional, required};

const TOOL_COLUMNS: &str = "id, name, description, category, website_url, logo_url, pricing_info, created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiTool {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Category id.
    pub category: Option<Uuid>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_info: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<Uuid>,
    #[serde(default)]
    pub website_url: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub pricing_info: Option<String>,
}

/// Validated tool fields. Every tool belongs to a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDraft {
    pub name: String,
    pub description: String,
    pub category: Uuid,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_info: Option<String>,
}

impl ToolInput {
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<ToolDraft, StoreError> {
        let name = required("name", &self.name)?;
        let description = required("description", &self.description)?;
        let category = self.category.ok_or_else(|| StoreError::invalid("category", "must be selected"))?;
        Ok(ToolDraft {
            name,
            description,
            category,
            website_url: optional(self.website_url.as_deref()),
            logo_url: optional(self.logo_url.as_deref()),
            pricing_info: optional(self.pricing_info.as_deref()),
        })
    }
}

fn tool_from_row(row: &PgRow) -> AiTool {
    AiTool {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        website_url: row.get("website_url"),
        logo_url: row.get("logo_url"),
        pricing_info: row.get("pricing_info"),
        created_at: row.get("created_at"),
    }
}

/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, StoreError> {
    let rows = sqlx::query("SELECT id, name FROM categories ORDER BY name ASC").fetch_all(pool).await?;
    Ok(rows.iter().map(|r| Category { id: r.get("id"), name: r.get("name") }).collect())
}

/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub async fn list_tools(pool: &PgPool) -> Result<Vec<AiTool>, StoreError> {
    let rows = sqlx::query(&format!("SELECT {TOOL_COLUMNS} FROM ai_tools ORDER BY name ASC"))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(tool_from_row).collect())
}

/// # Errors
///
/// Returns [`StoreError::Invalid`] for an unknown category.
pub async fn create_tool(pool: &PgPool, draft: &ToolDraft) -> Result<AiTool, StoreError> {
    let row = sqlx::query(&format!(
        r"INSERT INTO ai_tools (name, description, category, website_url, logo_url, pricing_info)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {TOOL_COLUMNS}"
    ))
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.category)
    .bind(&draft.website_url)
    .bind(&draft.logo_url)
    .bind(&draft.pricing_info)
    .fetch_one(pool)
    .await?;
    Ok(tool_from_row(&row))
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] for an unknown id.
pub async fn update_tool(pool: &PgPool, id: Uuid, draft: &ToolDraft) -> Result<AiTool, StoreError> {
    let row = sqlx::query(&format!(
        r"UPDATE ai_tools
          SET name = $2, description = $3, category = $4, website_url = $5, logo_url = $6, pricing_info = $7
          WHERE id = $1
          RETURNING {TOOL_COLUMNS}"
    ))
    .bind(id)
    .bind(&draft.name)
    .bind(&draft.description)
    .bind(draft.category)
    .bind(&draft.website_url)
    .bind(&draft.logo_url)
    .bind(&draft.pricing_info)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)?;
    Ok(tool_from_row(&row))
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] if nothing was deleted.
pub async fn delete_tool(pool: &PgPool, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM ai_tools WHERE id = $1").bind(id).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;
