//! Page controllers for route-level screens.
//!
//! ARCHITECTURE
//! ============
//! Each page owns one `ViewGuard` plus its notice queue and exposes the
//! screen's actions as async methods. Rendering is left to the host; the
//! controllers hold only data and decisions.
//!
//! ERROR HANDLING
//! ==============
//! Loaders never fail the guard for ordinary data errors. A failed read
//! pushes a notice and yields an empty list, so the page renders its empty
//! state instead of an error screen.

use std::sync::Arc;
use std::time::Duration;

use crate::net::api::{ApiError, DataStore, RoleLookup};
use crate::net::types::Session;
use crate::routes::Route;
use crate::state::auth::AuthStore;
use crate::state::gate::{DEFAULT_VIEW_TIMEOUT, Navigator, ViewGuard};
use crate::state::ui::{Notice, Notices};

pub mod admin_blog;
pub mod admin_tools;
pub mod blog;
pub mod dashboard;
pub mod login;
pub mod profile;
pub mod tools;

#[cfg(test)]
#[path = "pages_test.rs"]
mod pages_test;

/// Everything a page controller needs from the host.
#[derive(Clone)]
pub struct PageContext {
    pub auth: Arc<AuthStore>,
    pub data: Arc<dyn DataStore>,
    pub roles: Arc<dyn RoleLookup>,
    pub navigator: Arc<dyn Navigator>,
    pub base_url: String,
    pub view_timeout: Duration,
}

impl PageContext {
    #[must_use]
    pub fn new(
        auth: Arc<AuthStore>,
        data: Arc<dyn DataStore>,
        roles: Arc<dyn RoleLookup>,
        navigator: Arc<dyn Navigator>,
        base_url: impl Into<String>,
    ) -> Self {
        Self { auth, data, roles, navigator, base_url: base_url.into(), view_timeout: DEFAULT_VIEW_TIMEOUT }
    }

    #[must_use]
    pub fn with_view_timeout(mut self, timeout: Duration) -> Self {
        self.view_timeout = timeout;
        self
    }

    pub(crate) fn guard<T: Clone>(&self, route: Route) -> ViewGuard<T> {
        ViewGuard::with_timeout(route, self.view_timeout)
    }

    /// Current session for a write action. Without one, queue a notice and
    /// send the user to sign in.
    pub(crate) fn session_for_action(&self, notices: &Notices) -> Option<Session> {
        let session = self.auth.get_current().session().cloned();
        if session.is_none() {
            notices.push(Notice::error("로그인 필요", "다시 로그인해주세요."));
            self.navigator.navigate(&Route::Auth);
        }
        session
    }
}

/// Run a list read; on failure queue a notice and fall back to empty.
pub(crate) async fn list_or_empty<T, Fut>(notices: &Notices, title: &str, fut: Fut) -> Vec<T>
where
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    match fut.await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(error = %e, what = title, "list load failed");
            notices.push(Notice::from_api(title, &e));
            Vec::new()
        }
    }
}

/// Sign out from any page, then go home.
pub async fn sign_out(ctx: &PageContext, notices: &Notices) {
    if let Err(e) = ctx.auth.sign_out().await {
        notices.push(Notice::error("로그아웃 경고", e.to_string()));
    }
    ctx.navigator.navigate(&Route::Home);
}
