//! Search, filter, and slug helpers for the blog and tools catalogs.

#[cfg(test)]
#[path = "catalog_test.rs"]
mod catalog_test;

use std::collections::HashMap;

use uuid::Uuid;

use crate::net::types::{AiTool, BlogPost, Category, Tag};

/// URL slug from a post title: lowercase, anything outside `[a-z0-9]` and
/// Hangul syllables becomes `-`, runs collapse, and edge dashes are trimmed.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.chars().flat_map(char::to_lowercase) {
        let keep = ch.is_ascii_lowercase() || ch.is_ascii_digit() || ('가'..='힣').contains(&ch);
        if keep {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_owned()
}

fn matches_query(query: &str, fields: [&str; 2]) -> bool {
    let needle = query.trim().to_lowercase();
    needle.is_empty() || fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

/// Posts whose title or summary contains `query` (case-insensitive) and,
/// when `tag` is set, that carry that tag.
#[must_use]
pub fn filter_posts<'a>(posts: &'a [BlogPost], query: &str, tag: Option<Uuid>) -> Vec<&'a BlogPost> {
    posts
        .iter()
        .filter(|p| matches_query(query, [p.title.as_str(), p.summary.as_str()]))
        .filter(|p| tag.is_none_or(|t| p.tags.contains(&t)))
        .collect()
}

/// Category selector value; `All` disables the category filter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Uuid),
}

impl CategoryFilter {
    /// `"all"` (or empty) means no filter; anything else must be a category ID.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" | "all" => Some(Self::All),
            other => Uuid::parse_str(other).ok().map(Self::Only),
        }
    }
}

#[must_use]
pub fn filter_tools<'a>(tools: &'a [AiTool], query: &str, category: CategoryFilter) -> Vec<&'a AiTool> {
    tools
        .iter()
        .filter(|t| matches_query(query, [t.name.as_str(), t.description.as_str()]))
        .filter(|t| match category {
            CategoryFilter::All => true,
            CategoryFilter::Only(id) => t.category == Some(id),
        })
        .collect()
}

/// Display names for a post's tag IDs. Unknown IDs are skipped.
#[must_use]
pub fn tag_names(post: &BlogPost, tags: &[Tag]) -> Vec<String> {
    let by_id: HashMap<Uuid, &str> = tags.iter().map(|t| (t.id, t.name.as_str())).collect();
    post.tags.iter().filter_map(|id| by_id.get(id).map(|n| (*n).to_owned())).collect()
}

#[must_use]
pub fn category_name(tool: &AiTool, categories: &[Category]) -> Option<String> {
    let id = tool.category?;
    categories.iter().find(|c| c.id == id).map(|c| c.name.clone())
}

/// Toggle `id` in a tag selection, keeping insertion order.
pub fn toggle_tag(selected: &mut Vec<Uuid>, id: Uuid) {
    if let Some(pos) = selected.iter().position(|t| *t == id) {
        selected.remove(pos);
    } else {
        selected.push(id);
    }
}
