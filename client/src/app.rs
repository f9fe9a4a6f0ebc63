//! Composition root: builds the API client, credential store, identity
//! provider, and the one `AuthStore` for the process.
//!
//! DESIGN
//! ======
//! Hosts (the CLI, tests, a future UI shell) construct exactly one `App`
//! and hand `PageContext`s derived from it to page controllers. Provider
//! events (sign-in completed elsewhere, token refresh) go through
//! `App::events` and are applied in arrival order by the pump task. A
//! second task renews the session before its access token expires.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::{ClientConfig, SessionPersistence};
use crate::net::api::ApiClient;
use crate::net::provider::HttpIdentityProvider;
use crate::pages::PageContext;
use crate::state::auth::{AuthEvent, AuthStore};
use crate::state::credentials::{CredentialStore, FileCredentials, MemoryCredentials};
use crate::state::gate::Navigator;

pub struct App {
    pub config: ClientConfig,
    pub api: ApiClient,
    pub auth: Arc<AuthStore>,
    events: mpsc::UnboundedSender<AuthEvent>,
    pump: JoinHandle<()>,
    expiry: JoinHandle<()>,
}

impl App {
    /// Wire everything together and start the event pump. Must be called
    /// inside a tokio runtime.
    #[must_use]
    pub fn start(config: ClientConfig) -> Self {
        let credentials: Arc<dyn CredentialStore> = match &config.persistence {
            SessionPersistence::Persistent(path) => Arc::new(FileCredentials::new(path.clone())),
            SessionPersistence::Ephemeral => Arc::new(MemoryCredentials::new()),
        };
        Self::with_credentials(config, credentials)
    }

    #[must_use]
    pub fn with_credentials(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let api = ApiClient::new(config.base_url.clone());
        let provider = Arc::new(HttpIdentityProvider::new(api.clone()));
        let auth = Arc::new(AuthStore::with_timeout(provider, credentials, config.init_timeout));
        let (events, rx) = mpsc::unbounded_channel();
        let pump = auth.spawn_event_pump(rx);
        let expiry = auth.spawn_expiry_watch();
        info!(base_url = %config.base_url, persistence = ?config.persistence, "client started");
        Self { config, api, auth, events, pump, expiry }
    }

    /// Sender for provider-driven auth events.
    #[must_use]
    pub fn events(&self) -> mpsc::UnboundedSender<AuthEvent> {
        self.events.clone()
    }

    #[must_use]
    pub fn context(&self, navigator: Arc<dyn Navigator>) -> PageContext {
        let api = Arc::new(self.api.clone());
        PageContext::new(Arc::clone(&self.auth), api.clone(), api, navigator, self.config.base_url.clone())
            .with_view_timeout(self.config.view_timeout)
    }

    /// Stop accepting events and wait for queued ones to be applied.
    pub async fn shutdown(self) {
        drop(self.events);
        let _ = self.pump.await;
        self.expiry.abort();
    }
}
