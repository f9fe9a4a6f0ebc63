//! Auth-session state for the current user.
//!
//! SYSTEM CONTEXT
//! ==============
//! `AuthStore` is the single source of truth for "is there a session, and
//! what is it". It is built once per process, shared by `Arc`, and consumed
//! by route guards (`state::gate`) and anything identity-aware.
//!
//! DESIGN
//! ======
//! - State lives in a `watch` channel so `get_current` is a plain borrow and
//!   async consumers can await resolution without polling.
//! - `initialize` runs through a `OnceCell`: concurrent callers share one
//!   in-flight provider call, and a store-level timeout guarantees the state
//!   never stays `Unresolved`.
//! - Every mutation goes through `apply`, which holds one lock across the
//!   state write and listener dispatch. Listeners therefore see changes in
//!   arrival order, in registration order, never concurrently. Listeners
//!   must not call back into mutating store methods.
//! - Once resolved, the state never returns to `Unresolved`.
//! - `spawn_expiry_watch` renews a present session through the provider
//!   before it expires. A rejected refresh signs out; a failed one lets the
//!   session lapse to `Absent` at `expires_at`. Either way listeners and
//!   `watch` receivers see the change.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use time::OffsetDateTime;
use tokio::sync::{OnceCell, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::net::provider::{IdentityProvider, ProviderError};
use crate::net::types::{Credential, Session};
use crate::state::credentials::CredentialStore;

pub const DEFAULT_INIT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long before `expires_at` a session is renewed. Short-lived sessions
/// renew halfway through their lifetime instead.
pub const RENEWAL_MARGIN: time::Duration = time::Duration::seconds(60);

// =============================================================================
// STATE
// =============================================================================

/// Why session resolution ended without a usable answer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("identity provider error ({code}): {message}")]
    Provider { code: String, message: String },
    #[error("timed out waiting for the identity provider")]
    Timeout,
    #[error("stored credential unreadable: {0}")]
    Credential(String),
}

impl ResolutionError {
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Provider { code, .. } => code,
            Self::Timeout => "E_RESOLUTION_TIMEOUT",
            Self::Credential(_) => "E_CREDENTIAL_UNREADABLE",
        }
    }
}

impl From<ProviderError> for ResolutionError {
    fn from(err: ProviderError) -> Self {
        Self::Provider { code: err.code().to_owned(), message: err.to_string() }
    }
}

/// Resolution state of the store, with the session when one is present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    /// No attempt yet to determine whether a session exists.
    #[default]
    Unresolved,
    Present(Session),
    Absent,
    /// Resolution finished with an error; callers may offer a retry instead
    /// of a login prompt.
    Failed(ResolutionError),
}

impl AuthState {
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Present(session) => Some(session),
            _ => None,
        }
    }

    /// Same state, with a present-but-expired session reported as absent.
    #[must_use]
    pub fn at(self, now: OffsetDateTime) -> Self {
        match self {
            Self::Present(session) if session.is_expired_at(now) => Self::Absent,
            other => other,
        }
    }
}

/// When to renew `session`: `RENEWAL_MARGIN` before expiry, but never
/// before the halfway point of its lifetime.
#[must_use]
pub fn renewal_at(session: &Session) -> OffsetDateTime {
    let halfway = session.issued_at + (session.expires_at - session.issued_at) / 2;
    (session.expires_at - RENEWAL_MARGIN).max(halfway)
}

fn until(at: OffsetDateTime) -> Duration {
    Duration::try_from(at - OffsetDateTime::now_utc()).unwrap_or(Duration::ZERO)
}

/// Result of a renewal attempt, applied under the store lock.
enum Renewal {
    Refreshed(Session),
    /// The provider rejected the refresh token.
    Ended,
    /// Refresh failed and the access token has expired; the credential is
    /// kept so a later restore can retry.
    Lapsed,
}

/// Provider-driven session change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

// =============================================================================
// LISTENERS
// =============================================================================

type Listener = Arc<dyn Fn(&AuthState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Listener)>>,
}

impl Listeners {
    fn snapshot(&self) -> Vec<Listener> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    fn remove(&self, id: u64) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(entry_id, _)| *entry_id != id);
    }
}

/// Registration handle returned by [`AuthStore::subscribe`].
/// Dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    listeners: Weak<Listeners>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.remove(self.id);
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

pub struct AuthStore {
    provider: Arc<dyn IdentityProvider>,
    credentials: Arc<dyn CredentialStore>,
    init_timeout: Duration,
    state: watch::Sender<AuthState>,
    init: OnceCell<()>,
    listeners: Arc<Listeners>,
    /// Serializes state writes together with listener dispatch.
    apply_lock: Mutex<u64>,
}

impl AuthStore {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self::with_timeout(provider, credentials, DEFAULT_INIT_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(
        provider: Arc<dyn IdentityProvider>,
        credentials: Arc<dyn CredentialStore>,
        init_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(AuthState::Unresolved);
        Self {
            provider,
            credentials,
            init_timeout,
            state,
            init: OnceCell::new(),
            listeners: Arc::new(Listeners::default()),
            apply_lock: Mutex::new(0),
        }
    }

    /// Resolve the session once per store. Concurrent and repeated calls
    /// share the first attempt and return the current state.
    pub async fn initialize(&self) -> AuthState {
        self.init
            .get_or_init(|| async {
                let generation = self.generation();
                let (stored, outcome) = self.resolve().await;
                self.apply_if_unchanged(generation, stored.as_ref(), outcome);
            })
            .await;
        self.get_current()
    }

    /// Latest known state. Never blocks on I/O.
    #[must_use]
    pub fn get_current(&self) -> AuthState {
        self.state.borrow().clone().at(OffsetDateTime::now_utc())
    }

    /// Receiver for async consumers that want to observe every change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Wait until the store leaves `Unresolved`. Does not start resolution.
    pub async fn wait_resolved(&self) -> AuthState {
        let mut rx = self.state.subscribe();
        loop {
            let current = rx.borrow_and_update().clone();
            if current.is_resolved() {
                return current.at(OffsetDateTime::now_utc());
            }
            if rx.changed().await.is_err() {
                return self.get_current();
            }
        }
    }

    /// Register a change listener. Listeners fire in registration order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AuthState) + Send + Sync + 'static,
    {
        let id = self.listeners.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        Subscription { id, listeners: Arc::downgrade(&self.listeners) }
    }

    /// Invalidate the session with the provider, clear persisted credentials,
    /// and switch to `Absent`. Local teardown happens even when the provider
    /// call fails; the provider error is returned afterwards.
    ///
    /// # Errors
    ///
    /// Returns the provider's error if remote invalidation failed.
    pub async fn sign_out(&self) -> Result<(), ProviderError> {
        let session = self.state.borrow().session().cloned();
        let remote = match &session {
            Some(session) => self.provider.sign_out(session).await,
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!(error = %e, "provider sign-out failed; clearing local session anyway");
        }
        self.clear_credentials();
        self.apply(AuthState::Absent);
        info!("signed out");
        remote
    }

    /// Apply a provider-driven event.
    pub fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) | AuthEvent::TokenRefreshed(session) => {
                if let Err(e) = self.credentials.save(&session.credential()) {
                    warn!(error = %e, "failed to persist credential");
                }
                debug!(user_id = %session.user.id, "session updated");
                self.apply(AuthState::Present(session));
            }
            AuthEvent::SignedOut => {
                self.clear_credentials();
                self.apply(AuthState::Absent);
            }
        }
    }

    /// Drain `events` into [`AuthStore::handle_event`] until the sender closes.
    pub fn spawn_event_pump(self: &Arc<Self>, mut events: mpsc::UnboundedReceiver<AuthEvent>) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                store.handle_event(event);
            }
        })
    }

    /// Keep a present session alive: renew it ahead of expiry, and commit
    /// `Absent` when it cannot be renewed. Exits when the store is dropped.
    pub fn spawn_expiry_watch(self: &Arc<Self>) -> JoinHandle<()> {
        let store = Arc::downgrade(self);
        let mut rx = self.state.subscribe();
        tokio::spawn(async move {
            loop {
                let session = rx.borrow_and_update().session().cloned();
                let Some(session) = session else {
                    if rx.changed().await.is_err() {
                        return;
                    }
                    continue;
                };
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        continue;
                    }
                    () = tokio::time::sleep(until(renewal_at(&session))) => {}
                }
                let Some(store) = store.upgrade() else {
                    return;
                };
                store.renew(&session).await;
            }
        })
    }

    // -------------------------------------------------------------------------
    // internals
    // -------------------------------------------------------------------------

    async fn renew(&self, session: &Session) {
        let generation = self.generation();
        let still_current =
            self.state.borrow().session().is_some_and(|current| current.access_token == session.access_token);
        if !still_current {
            return;
        }

        let renewal = match tokio::time::timeout(self.init_timeout, self.provider.refresh(session)).await {
            Ok(Ok(Some(next))) => {
                debug!(user_id = %next.user.id, "session renewed");
                Renewal::Refreshed(next)
            }
            Ok(Ok(None)) => {
                info!(user_id = %session.user.id, "refresh rejected; signing out");
                Renewal::Ended
            }
            Ok(Err(e)) => {
                warn!(error = %e, code = e.code(), "session renewal failed");
                tokio::time::sleep(until(session.expires_at)).await;
                Renewal::Lapsed
            }
            Err(_) => {
                warn!(timeout_ms = self.init_timeout.as_millis(), "session renewal timed out");
                tokio::time::sleep(until(session.expires_at)).await;
                Renewal::Lapsed
            }
        };
        self.apply_renewal(generation, renewal);
    }

    /// Apply a renewal unless something else changed the state meanwhile.
    fn apply_renewal(&self, generation: u64, renewal: Renewal) {
        let mut current = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            debug!("discarding stale renewal");
            return;
        }
        let next = match renewal {
            Renewal::Refreshed(session) => {
                if let Err(e) = self.credentials.save(&session.credential()) {
                    warn!(error = %e, "failed to persist renewed credential");
                }
                AuthState::Present(session)
            }
            Renewal::Ended => {
                self.clear_credentials();
                AuthState::Absent
            }
            Renewal::Lapsed => AuthState::Absent,
        };
        self.commit(&mut current, next);
    }

    async fn resolve(&self) -> (Option<Credential>, AuthState) {
        let credential = match self.credentials.load() {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "could not read stored credential");
                return (None, AuthState::Failed(ResolutionError::Credential(e.to_string())));
            }
        };

        let state = match tokio::time::timeout(self.init_timeout, self.provider.restore(credential.as_ref())).await {
            Ok(Ok(Some(session))) => {
                info!(user_id = %session.user.id, "session restored");
                AuthState::Present(session)
            }
            Ok(Ok(None)) => {
                debug!("no session");
                AuthState::Absent
            }
            Ok(Err(e)) => {
                warn!(error = %e, code = e.code(), "session restore failed");
                AuthState::Failed(e.into())
            }
            Err(_) => {
                warn!(timeout_ms = self.init_timeout.as_millis(), "session restore timed out");
                AuthState::Failed(ResolutionError::Timeout)
            }
        };
        (credential, state)
    }

    /// Bring the persisted credential in line with a restore outcome.
    /// Failures leave the stored credential alone so a later retry can use it.
    fn sync_credentials(&self, stored: Option<&Credential>, outcome: &AuthState) {
        match outcome {
            AuthState::Present(session) if stored != Some(&session.credential()) => {
                if let Err(e) = self.credentials.save(&session.credential()) {
                    warn!(error = %e, "failed to persist refreshed credential");
                }
            }
            AuthState::Absent if stored.is_some() => self.clear_credentials(),
            _ => {}
        }
    }

    fn clear_credentials(&self) {
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "failed to clear stored credential");
        }
    }

    fn generation(&self) -> u64 {
        *self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply the initialize outcome unless an event or sign-out landed while
    /// the provider call was in flight; that newer state wins.
    fn apply_if_unchanged(&self, generation: u64, stored: Option<&Credential>, next: AuthState) {
        let mut current = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != generation {
            debug!("discarding stale initialize outcome");
            return;
        }
        self.sync_credentials(stored, &next);
        self.commit(&mut current, next);
    }

    fn apply(&self, next: AuthState) {
        let mut current = self.apply_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.commit(&mut current, next);
    }

    fn commit(&self, generation: &mut u64, next: AuthState) {
        if !next.is_resolved() {
            return;
        }
        *generation += 1;
        self.state.send_replace(next.clone());
        for listener in self.listeners.snapshot() {
            listener(&next);
        }
    }
}
