//! Auth entry page: OAuth provider buttons plus any error from a failed
//! callback.
//!
//! SYSTEM CONTEXT
//! ==============
//! Guest-only. A user who already has a session is sent to the dashboard.
//! The buttons are plain links to the server's `/auth/{provider}` route,
//! which starts the authorization-code flow and lands back on
//! `/dashboard` (or `/auth?error=...`).

#[cfg(test)]
#[path = "login_test.rs"]
mod login_test;

use url::form_urlencoded;

use super::PageContext;
use crate::net::api::sign_in_url;
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};

/// Sign-in providers offered on the page, in display order.
pub const PROVIDERS: [(&str, &str); 3] = [("google", "Google"), ("github", "GitHub"), ("kakao", "Kakao")];

pub struct LoginPage {
    ctx: PageContext,
    guard: ViewGuard<()>,
    error: Option<String>,
}

impl LoginPage {
    /// `query` is the raw query string of the `/auth` URL, if any.
    #[must_use]
    pub fn new(ctx: PageContext, query: Option<&str>) -> Self {
        let guard = ctx.guard(Route::Auth);
        let error = query.and_then(|q| query_param(q, "error")).filter(|e| !e.is_empty());
        Self { ctx, guard, error }
    }

    pub async fn open(&self) -> GateState<()> {
        self.guard
            .run(&self.ctx.auth, self.ctx.roles.as_ref(), self.ctx.navigator.as_ref(), |_| async { Ok(()) })
            .await
    }

    /// Error message carried back from a failed sign-in.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn sign_in_url(&self, provider: &str) -> Option<String> {
        PROVIDERS
            .iter()
            .any(|(id, _)| *id == provider)
            .then(|| sign_in_url(&self.ctx.base_url, provider))
    }
}

/// Value of `key` in a URL query string or fragment, form-decoded.
#[must_use]
pub fn query_param(query: &str, key: &str) -> Option<String> {
    form_urlencoded::parse(query.trim_start_matches(['?', '#']).as_bytes())
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
