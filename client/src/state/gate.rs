//! Auth-gated view guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every page controller owns one `ViewGuard`. The guard waits for the auth
//! store to resolve, applies the route's access policy, runs the admin role
//! check where needed, and only then runs the page's data loader.
//!
//! DESIGN
//! ======
//! The decision logic is split into pure functions (`next_step`,
//! `role_step`) so the policy table is testable without a runtime. The
//! guard itself is a small async driver over those steps:
//!
//! ```text
//! WaitingForResolution ─┬─> Redirecting(route)
//!                       ├─> CheckingRole ─┬─> Redirecting(/dashboard)
//!                       │                 └─> LoadingData
//!                       ├─> LoadingData ──┬─> Ready(data)
//!                       │                 └─> Error(data error)
//!                       └─> Error(resolution error)
//! ```
//!
//! TRADE-OFFS
//! ==========
//! Admin views check the role before fetching, so admin data is never
//! requested for a non-admin. That costs one extra round trip on admin pages.

#[cfg(test)]
#[path = "gate_test.rs"]
mod gate_test;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::net::api::{ApiError, RoleLookup};
use crate::net::types::Session;
use crate::routes::{Access, Route};
use crate::state::auth::{AuthState, AuthStore, ResolutionError};

pub const DEFAULT_VIEW_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// STATES AND STEPS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("could not determine sign-in state: {0}")]
    Resolution(ResolutionError),
    #[error("could not load data: {0}")]
    Data(ApiError),
}

#[derive(Clone, Debug, PartialEq)]
pub enum GateState<T> {
    WaitingForResolution,
    CheckingRole,
    LoadingData,
    Ready(T),
    Redirecting(Route),
    Error(GateError),
}

impl<T> GateState<T> {
    #[must_use]
    pub fn data(&self) -> Option<&T> {
        match self {
            Self::Ready(data) => Some(data),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Ready(_) | Self::Redirecting(_) | Self::Error(_))
    }
}

/// What a guard should do next, given the route policy and store state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Wait,
    Redirect(Route),
    CheckRole,
    Load,
    Fail(ResolutionError),
}

#[must_use]
pub fn next_step(access: Access, state: &AuthState) -> Step {
    match (state, access) {
        (AuthState::Unresolved, _) => Step::Wait,
        (AuthState::Failed(err), Access::Authenticated | Access::Admin) => Step::Fail(err.clone()),
        (AuthState::Failed(_), Access::Public | Access::GuestOnly) => Step::Load,
        (AuthState::Absent, Access::Authenticated | Access::Admin) => Step::Redirect(Route::Auth),
        (AuthState::Absent, Access::Public | Access::GuestOnly) => Step::Load,
        (AuthState::Present(_), Access::GuestOnly) => Step::Redirect(Route::Dashboard),
        (AuthState::Present(_), Access::Admin) => Step::CheckRole,
        (AuthState::Present(_), Access::Public | Access::Authenticated) => Step::Load,
    }
}

/// Role-check outcome. Anything but a definite `true` is treated as not-admin.
#[must_use]
pub fn role_step(result: &Result<bool, ApiError>) -> Step {
    match result {
        Ok(true) => Step::Load,
        Ok(false) | Err(_) => Step::Redirect(Route::Dashboard),
    }
}

/// Side-effecting navigation, supplied by the host (router, CLI, test).
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &Route);
}

/// Navigator that only records the last requested route.
#[derive(Debug, Default)]
pub struct NoopNavigator {
    last: Mutex<Option<Route>>,
}

impl NoopNavigator {
    #[must_use]
    pub fn last(&self) -> Option<Route> {
        self.last.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for NoopNavigator {
    fn navigate(&self, route: &Route) {
        *self.last.lock().unwrap_or_else(PoisonError::into_inner) = Some(route.clone());
    }
}

// =============================================================================
// VIEW GUARD
// =============================================================================

pub struct ViewGuard<T> {
    route: Route,
    timeout: Duration,
    state: Mutex<GateState<T>>,
    mounted: AtomicBool,
    started: AtomicBool,
    redirected: AtomicBool,
}

impl<T: Clone> ViewGuard<T> {
    #[must_use]
    pub fn new(route: Route) -> Self {
        Self::with_timeout(route, DEFAULT_VIEW_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(route: Route, timeout: Duration) -> Self {
        Self {
            route,
            timeout,
            state: Mutex::new(GateState::WaitingForResolution),
            mounted: AtomicBool::new(true),
            started: AtomicBool::new(false),
            redirected: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub fn route(&self) -> &Route {
        &self.route
    }

    #[must_use]
    pub fn state(&self) -> GateState<T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Mutate loaded data in place (after a create/delete on the page).
    /// No-op unless the guard is `Ready`.
    pub fn update_data(&self, f: impl FnOnce(&mut T)) {
        if let GateState::Ready(data) = &mut *self.state.lock().unwrap_or_else(PoisonError::into_inner) {
            f(data);
        }
    }

    /// Mark the view as gone. Results arriving after this are dropped.
    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Drive the guard to a settled state. Only the first call does any
    /// work; later calls return the current state.
    pub async fn run<F, Fut>(
        &self,
        store: &Arc<AuthStore>,
        roles: &dyn RoleLookup,
        navigator: &dyn Navigator,
        load: F,
    ) -> GateState<T>
    where
        F: FnOnce(Option<Session>) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.state();
        }

        let init = Arc::clone(store);
        tokio::spawn(async move {
            init.initialize().await;
        });

        let auth = match tokio::time::timeout(self.timeout, store.wait_resolved()).await {
            Ok(auth) => auth,
            Err(_) => {
                warn!(route = %self.route, "auth resolution timed out for view");
                self.set(GateState::Error(GateError::Resolution(ResolutionError::Timeout)));
                return self.state();
            }
        };
        if !self.is_mounted() {
            return self.state();
        }

        let session = auth.session().cloned();
        let mut step = next_step(self.route.access(), &auth);

        if step == Step::CheckRole {
            self.set(GateState::CheckingRole);
            let result = match &session {
                Some(session) => roles.is_admin(session).await,
                None => Ok(false),
            };
            if let Err(e) = &result {
                warn!(route = %self.route, error = %e, "role lookup failed; treating as non-admin");
            }
            if !self.is_mounted() {
                return self.state();
            }
            step = role_step(&result);
        }

        match step {
            Step::Redirect(target) => self.redirect(navigator, target),
            Step::Fail(err) => self.set(GateState::Error(GateError::Resolution(err))),
            Step::Load => {
                self.set(GateState::LoadingData);
                let outcome = load(session).await;
                if !self.is_mounted() {
                    debug!(route = %self.route, "view unmounted; dropping loaded data");
                    return self.state();
                }
                match outcome {
                    Ok(data) => self.set(GateState::Ready(data)),
                    Err(e) => {
                        warn!(route = %self.route, error = %e, "view data load failed");
                        self.set(GateState::Error(GateError::Data(e)));
                    }
                }
            }
            Step::Wait | Step::CheckRole => {}
        }
        self.state()
    }

    fn set(&self, next: GateState<T>) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn redirect(&self, navigator: &dyn Navigator, target: Route) {
        self.set(GateState::Redirecting(target.clone()));
        if !self.redirected.swap(true, Ordering::SeqCst) {
            debug!(from = %self.route, to = %target, "redirecting");
            navigator.navigate(&target);
        }
    }
}
