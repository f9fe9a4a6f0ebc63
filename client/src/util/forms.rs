//! Form input validation for the subscription, post, tool, and profile forms.
//!
//! Forms hold raw strings as typed by the user. `validate` turns them into
//! the typed drafts the data store accepts, or reports what is wrong so the
//! page can show an inline notice without submitting.

#[cfg(test)]
#[path = "forms_test.rs"]
mod forms_test;

use time::Date;
use time::macros::format_description;
use uuid::Uuid;

use crate::net::types::{AiTool, BillingCycle, BlogPost, PostDraft, Subscription, SubscriptionDraft, ToolDraft};
use crate::util::catalog::slugify;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("required fields missing: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("invalid {field}: {value:?}")]
    Invalid { field: &'static str, value: String },
}

fn missing(fields: &[(&'static str, &str)]) -> Result<(), FormError> {
    let empty: Vec<&'static str> =
        fields.iter().filter(|(_, v)| v.trim().is_empty()).map(|(name, _)| *name).collect();
    if empty.is_empty() { Ok(()) } else { Err(FormError::MissingFields(empty)) }
}

fn optional(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `FormError::Invalid` when `raw` is not a calendar date.
pub fn parse_date(field: &'static str, raw: &str) -> Result<Date, FormError> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| FormError::Invalid { field, value: raw.to_owned() })
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubscriptionForm {
    pub service_name: String,
    pub amount: String,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: String,
    pub notes: String,
}

impl SubscriptionForm {
    /// Blank form with the next payment defaulting to `today`.
    #[must_use]
    pub fn blank(today: Date) -> Self {
        Self { next_payment_date: today.to_string(), ..Self::default() }
    }

    /// Form pre-filled for editing an existing row.
    #[must_use]
    pub fn from_row(row: &Subscription) -> Self {
        Self {
            service_name: row.service_name.clone(),
            amount: row.amount.to_string(),
            billing_cycle: row.billing_cycle,
            next_payment_date: row.next_payment_date.to_string(),
            notes: row.notes.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns `FormError` when the name or amount is blank, the amount is not
    /// a non-negative number, or the date is malformed.
    pub fn validate(&self) -> Result<SubscriptionDraft, FormError> {
        missing(&[("service_name", self.service_name.as_str()), ("amount", self.amount.as_str())])?;
        let amount: f64 = self
            .amount
            .trim()
            .parse()
            .ok()
            .filter(|a: &f64| a.is_finite() && *a >= 0.0)
            .ok_or_else(|| FormError::Invalid { field: "amount", value: self.amount.clone() })?;
        Ok(SubscriptionDraft {
            service_name: self.service_name.trim().to_owned(),
            amount,
            billing_cycle: self.billing_cycle,
            next_payment_date: parse_date("next_payment_date", self.next_payment_date.as_str())?,
            notes: optional(&self.notes),
        })
    }
}

// =============================================================================
// BLOG POSTS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub thumbnail_url: String,
    pub tags: Vec<Uuid>,
}

impl PostForm {
    #[must_use]
    pub fn from_row(row: &BlogPost) -> Self {
        Self {
            title: row.title.clone(),
            slug: row.slug.clone(),
            summary: row.summary.clone(),
            content: row.content.clone(),
            thumbnail_url: row.thumbnail_url.clone().unwrap_or_default(),
            tags: row.tags.clone(),
        }
    }

    /// Editing the title regenerates the slug.
    pub fn set_title(&mut self, title: &str) {
        title.clone_into(&mut self.title);
        self.slug = slugify(title);
    }

    /// # Errors
    ///
    /// Returns `FormError::MissingFields` when title, slug, summary, or content is blank.
    pub fn validate(&self) -> Result<PostDraft, FormError> {
        missing(&[
            ("title", self.title.as_str()),
            ("slug", self.slug.as_str()),
            ("summary", self.summary.as_str()),
            ("content", self.content.as_str()),
        ])?;
        Ok(PostDraft {
            title: self.title.trim().to_owned(),
            slug: self.slug.trim().to_owned(),
            summary: self.summary.trim().to_owned(),
            content: self.content.clone(),
            thumbnail_url: optional(&self.thumbnail_url),
            tags: self.tags.clone(),
        })
    }
}

// =============================================================================
// TOOLS
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolForm {
    pub name: String,
    pub description: String,
    /// Category ID as selected; blank until chosen.
    pub category: String,
    pub website_url: String,
    pub logo_url: String,
    pub pricing_info: String,
}

impl ToolForm {
    #[must_use]
    pub fn from_row(row: &AiTool) -> Self {
        Self {
            name: row.name.clone(),
            description: row.description.clone(),
            category: row.category.map(|c| c.to_string()).unwrap_or_default(),
            website_url: row.website_url.clone().unwrap_or_default(),
            logo_url: row.logo_url.clone().unwrap_or_default(),
            pricing_info: row.pricing_info.clone().unwrap_or_default(),
        }
    }

    /// # Errors
    ///
    /// Returns `FormError` when name, description, or category is blank, or
    /// the category is not an ID.
    pub fn validate(&self) -> Result<ToolDraft, FormError> {
        missing(&[
            ("name", self.name.as_str()),
            ("description", self.description.as_str()),
            ("category", self.category.as_str()),
        ])?;
        let category = Uuid::parse_str(self.category.trim())
            .map_err(|_| FormError::Invalid { field: "category", value: self.category.clone() })?;
        Ok(ToolDraft {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            category,
            website_url: optional(&self.website_url),
            logo_url: optional(&self.logo_url),
            pricing_info: optional(&self.pricing_info),
        })
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// # Errors
///
/// Returns `FormError::MissingFields` for a blank username.
pub fn validate_username(raw: &str) -> Result<String, FormError> {
    missing(&[("username", raw)])?;
    Ok(raw.trim().to_owned())
}
