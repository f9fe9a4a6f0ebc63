//! Subscription service: per-user CRUD over `subscriptions`.
//!
//! Every query is scoped by `user_id`, so a caller can never read or touch
//! another user's rows; a foreign id behaves exactly like a missing one.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::error::{StoreError, optional, required};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, service_name, amount, billing_cycle, next_payment_date, notes, created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Weekly,
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
        Self::ALL.into_iter().find(|c| c.as_str() == raw.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
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

/// Raw create/update body. `billing_cycle` and `next_payment_date` arrive as
/// text so validation can name the offending field; `amount` is a JSON number.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionInput {
    pub service_name: String,
    pub amount: f64,
    pub billing_cycle: String,
    pub next_payment_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validated subscription fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDraft {
    pub service_name: String,
    pub amount: f64,
    pub billing_cycle: BillingCycle,
    pub next_payment_date: Date,
    pub notes: Option<String>,
}

impl SubscriptionInput {
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<SubscriptionDraft, StoreError> {
        let service_name = required("service_name", &self.service_name)?;
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err(StoreError::invalid("amount", "must be a non-negative number"));
        }
        let billing_cycle = BillingCycle::parse(&self.billing_cycle)
            .ok_or_else(|| StoreError::invalid("billing_cycle", format!("unknown cycle {:?}", self.billing_cycle)))?;
        let next_payment_date = parse_date(&self.next_payment_date)?;
        Ok(SubscriptionDraft {
            service_name,
            amount: self.amount,
            billing_cycle,
            next_payment_date,
            notes: optional(self.notes.as_deref()),
        })
    }
}

fn parse_date(raw: &str) -> Result<Date, StoreError> {
    Date::parse(raw.trim(), time::macros::format_description!("[year]-[month]-[day]"))
        .map_err(|_| StoreError::invalid("next_payment_date", format!("expected YYYY-MM-DD, got {raw:?}")))
}

fn subscription_from_row(row: &PgRow) -> Result<Subscription, StoreError> {
    let cycle: String = row.get("billing_cycle");
    let billing_cycle = BillingCycle::parse(&cycle)
        .ok_or_else(|| StoreError::invalid("billing_cycle", format!("stored cycle {cycle:?} is unknown")))?;
    Ok(Subscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        service_name: row.get("service_name"),
        amount: row.get("amount"),
        billing_cycle,
        next_payment_date: row.get("next_payment_date"),
        notes: row.get("notes"),
        created_at: row.get("created_at"),
    })
}

/// The caller's subscriptions, soonest payment first.
///
/// # Errors
///
/// Returns a [`StoreError`] if the query fails.
pub async fn list_subscriptions(pool: &PgPool, user_id: Uuid) -> Result<Vec<Subscription>, StoreError> {
    let rows = sqlx::query(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = $1 ORDER BY next_payment_date ASC, created_at ASC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.iter().map(subscription_from_row).collect()
}

/// # Errors
///
/// Returns a [`StoreError`] if the insert fails.
pub async fn create_subscription(
    pool: &PgPool,
    user_id: Uuid,
    draft: &SubscriptionDraft,
) -> Result<Subscription, StoreError> {
    let row = sqlx::query(&format!(
        r"INSERT INTO subscriptions (user_id, service_name, amount, billing_cycle, next_payment_date, notes)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {SUBSCRIPTION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(&draft.service_name)
    .bind(draft.amount)
    .bind(draft.billing_cycle.as_str())
    .bind(draft.next_payment_date)
    .bind(&draft.notes)
    .fetch_one(pool)
    .await?;
    subscription_from_row(&row)
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] if the row does not exist or belongs to
/// someone else.
pub async fn update_subscription(
    pool: &PgPool,
    user_id: Uuid,
    id: Uuid,
    draft: &SubscriptionDraft,
) -> Result<Subscription, StoreError> {
    let row = sqlx::query(&format!(
        r"UPDATE subscriptions
          SET service_name = $3, amount = $4, billing_cycle = $5, next_payment_date = $6, notes = $7
          WHERE id = $1 AND user_id = $2
          RETURNING {SUBSCRIPTION_COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(&draft.service_name)
    .bind(draft.amount)
    .bind(draft.billing_cycle.as_str())
    .bind(draft.next_payment_date)
    .bind(&draft.notes)
    .fetch_optional(pool)
    .await?
    .ok_or(StoreError::NotFound)?;
    subscription_from_row(&row)
}

/// # Errors
///
/// Returns [`StoreError::NotFound`] if nothing was deleted.
pub async fn delete_subscription(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
#[path = "subscription_test.rs"]
mod tests;
