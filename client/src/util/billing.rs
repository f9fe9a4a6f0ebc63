//! Subscription cost arithmetic for the dashboard.
//!
//! Amounts are normalized per billing cycle: a weekly charge counts 4.33
//! times a month and 52 times a year; longer cycles are divided down for the
//! monthly figure and multiplied up for the yearly one.

#[cfg(test)]
#[path = "billing_test.rs"]
mod billing_test;

use time::{Date, Duration};

use crate::net::types::{BillingCycle, Subscription};

/// Days ahead that count as "upcoming".
pub const UPCOMING_WINDOW_DAYS: i64 = 30;
/// Days ahead that get the "payment soon" badge.
pub const SOON_WINDOW_DAYS: i64 = 7;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Totals {
    pub monthly: f64,
    pub yearly: f64,
}

/// Monthly-equivalent cost of one charge of `amount`.
#[must_use]
pub fn monthly_cost(amount: f64, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Weekly => amount * 4.33,
        BillingCycle::Monthly => amount,
        BillingCycle::Quarterly => amount / 3.0,
        BillingCycle::Biannually => amount / 6.0,
        BillingCycle::Yearly => amount / 12.0,
    }
}

/// Yearly-equivalent cost of one charge of `amount`.
#[must_use]
pub fn yearly_cost(amount: f64, cycle: BillingCycle) -> f64 {
    match cycle {
        BillingCycle::Weekly => amount * 52.0,
        BillingCycle::Monthly => amount * 12.0,
        BillingCycle::Quarterly => amount * 4.0,
        BillingCycle::Biannually => amount * 2.0,
        BillingCycle::Yearly => amount,
    }
}

#[must_use]
pub fn totals(subscriptions: &[Subscription]) -> Totals {
    subscriptions.iter().fold(Totals::default(), |acc, sub| Totals {
        monthly: acc.monthly + monthly_cost(sub.amount, sub.billing_cycle),
        yearly: acc.yearly + yearly_cost(sub.amount, sub.billing_cycle),
    })
}

/// Subscriptions charging within `[today, today + 30 days]`, soonest first.
#[must_use]
pub fn upcoming(subscriptions: &[Subscription], today: Date) -> Vec<Subscription> {
    let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);
    let mut due: Vec<Subscription> = subscriptions
        .iter()
        .filter(|sub| sub.next_payment_date >= today && sub.next_payment_date <= horizon)
        .cloned()
        .collect();
    due.sort_by_key(|sub| sub.next_payment_date);
    due
}

/// Whole days from `today` until the next charge (negative when overdue).
#[must_use]
pub fn days_until(sub: &Subscription, today: Date) -> i64 {
    (sub.next_payment_date - today).whole_days()
}

#[must_use]
pub fn is_payment_soon(sub: &Subscription, today: Date) -> bool {
    (0..=SOON_WINDOW_DAYS).contains(&days_until(sub, today))
}

/// Format a won amount with thousands separators, rounded to whole won.
#[must_use]
pub fn format_won(amount: f64) -> String {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    out.push('원');
    out
}
