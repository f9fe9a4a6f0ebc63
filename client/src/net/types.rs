//! Typed records for the client/server boundary.
//!
//! DESIGN
//! ======
//! Every collection the app reads has an explicit struct here so rows are
//! parsed (and rejected) at the boundary instead of being passed around as
//! loose JSON. Field names mirror the server's JSON bodies exactly.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// =============================================================================
// SESSION
// =============================================================================

/// Identity attached to a session, as reported by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Profile identifier (the session subject).
    pub id: Uuid,
    pub email: Option<String>,
    /// OAuth provider that authenticated this identity (`github`, `google`, `kakao`).
    pub provider: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

/// An authenticated session. Tokens are opaque and never inspected client-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: Identity,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl Session {
    /// Whether the access credential has passed its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub fn credential(&self) -> Credential {
        Credential { access_token: self.access_token.clone(), refresh_token: self.refresh_token.clone() }
    }
}

/// Persisted credential material. This is all that survives a restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
}

/// Body of `GET /api/auth/session`: the server never echoes tokens back.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionInfo {
    pub user: Identity,
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

impl SessionInfo {
    #[must_use]
    pub fn into_session(self, credential: Credential) -> Session {
        Session {
            access_token: credential.access_token,
            refresh_token: credential.refresh_token,
            user: self.user,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        }
    }
}

// =============================================================================
// PROFILES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

// =============================================================================
// SUBSCRIPTIONS
// =============================================================================

/// How often a subscription charges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
    Quarterly,
    Biannually,
    Yearly,
}

impl BillingCycle {
    pub const ALL: [Self; 5] = [Self::Weekly, Self::Monthly, Self::Quarterly, Self::Biannually, Self::Yearly];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Biannually => "biannually",
            Self::Yearly => "yearly",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cycle| cycle.as_str() == raw.trim())
    }

    /// Display label used on subscription cards.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Weekly => "주간",
            Self::Monthly => "월간",
            Self::Quarterly => "분기",
            Self::Biannually => "반기",
            Self::Yearly => "연간",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub service_name: String,
    pub amount: f64,
    pub billing_cycle: BillingCycle,
    #[serde(with = "iso_date")]
    pub next_payment_date: Date,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated create/update body for a subscription.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub amount: f64,
    pub billing_cycle: BillingCycle,
    #[serde(with = "iso_date")]
    pub next_payment_date: Date,
    pub notes: Option<String>,
}

// =============================================================================
// BLOG
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Author columns joined onto a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAuthor {
    pub username: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub author_id: Option<Uuid>,
    /// Tag IDs, resolved against the tag list for display.
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub author: Option<PostAuthor>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostDraft {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<Uuid>,
}

// =============================================================================
// TOOLS CATALOG
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiTool {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Category ID.
    pub category: Option<Uuid>,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_info: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDraft {
    pub name: String,
    pub description: String,
    pub category: Uuid,
    pub website_url: Option<String>,
    pub logo_url: Option<String>,
    pub pricing_info: Option<String>,
}
