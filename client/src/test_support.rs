//! Shared test doubles for store, guard, and page tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::net::api::{ApiError, DataStore, RoleLookup};
use crate::net::provider::{IdentityProvider, ProviderError};
use crate::net::types::{
    AiTool, BillingCycle, BlogPost, Category, Credential, Identity, PostDraft, Profile, Session, Subscription,
    SubscriptionDraft, Tag, ToolDraft,
};
use crate::routes::Route;
use crate::state::auth::AuthStore;
use crate::state::credentials::MemoryCredentials;
use crate::state::gate::Navigator;

// =============================================================================
// SESSIONS
// =============================================================================

pub fn user_id() -> Uuid {
    Uuid::from_u128(0x42)
}

pub fn session_expiring_in(ttl: time::Duration) -> Session {
    let now = OffsetDateTime::now_utc();
    Session {
        access_token: format!("acc-{}", Uuid::new_v4()),
        refresh_token: format!("ref-{}", Uuid::new_v4()),
        user: Identity {
            id: user_id(),
            email: Some("ada@example.com".to_owned()),
            provider: "github".to_owned(),
            username: Some("ada".to_owned()),
            avatar_url: None,
        },
        issued_at: now,
        expires_at: now + ttl,
    }
}

pub fn session() -> Session {
    session_expiring_in(time::Duration::hours(1))
}

pub fn credential() -> Credential {
    Credential { access_token: "stored-acc".to_owned(), refresh_token: "stored-ref".to_owned() }
}

// =============================================================================
// PROVIDER
// =============================================================================

#[derive(Clone)]
pub enum Outcome {
    Session(Session),
    NoSession,
    Error(ProviderError),
}

/// Identity provider returning a fixed outcome after an optional delay.
pub struct MockProvider {
    outcome: Outcome,
    delay: Duration,
    sign_out_error: Option<ProviderError>,
    refresh_outcome: Outcome,
    pub restore_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub sign_out_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            delay: Duration::ZERO,
            sign_out_error: None,
            refresh_outcome: Outcome::NoSession,
            restore_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_sign_out(mut self, err: ProviderError) -> Self {
        self.sign_out_error = Some(err);
        self
    }

    /// What `refresh` answers; defaults to a rejected refresh token.
    pub fn refreshing(mut self, outcome: Outcome) -> Self {
        self.refresh_outcome = outcome;
        self
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn restores(&self) -> usize {
        self.restore_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn restore(&self, _credential: Option<&Credential>) -> Result<Option<Session>, ProviderError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.outcome {
            Outcome::Session(session) => Ok(Some(session.clone())),
            Outcome::NoSession => Ok(None),
            Outcome::Error(err) => Err(err.clone()),
        }
    }

    async fn refresh(&self, _session: &Session) -> Result<Option<Session>, ProviderError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        match &self.refresh_outcome {
            Outcome::Session(session) => Ok(Some(session.clone())),
            Outcome::NoSession => Ok(None),
            Outcome::Error(err) => Err(err.clone()),
        }
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), ProviderError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        match &self.sign_out_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub fn store_with(provider: MockProvider) -> (Arc<AuthStore>, Arc<MockProvider>, Arc<MemoryCredentials>) {
    let provider = Arc::new(provider);
    let credentials = Arc::new(MemoryCredentials::with(credential()));
    let store = Arc::new(AuthStore::new(provider.clone(), credentials.clone()));
    (store, provider, credentials)
}

/// Store already resolved to the given outcome.
pub async fn resolved_store(outcome: Outcome) -> Arc<AuthStore> {
    let (store, _, _) = store_with(MockProvider::new(outcome));
    store.initialize().await;
    store
}

// =============================================================================
// ROLES / NAVIGATION
// =============================================================================

pub struct FixedRole {
    answer: Result<bool, ApiError>,
    pub calls: AtomicUsize,
}

impl FixedRole {
    pub fn admin() -> Self {
        Self::answering(Ok(true))
    }

    pub fn member() -> Self {
        Self::answering(Ok(false))
    }

    pub fn answering(answer: Result<bool, ApiError>) -> Self {
        Self { answer, calls: AtomicUsize::new(0) }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleLookup for FixedRole {
    async fn is_admin(&self, _session: &Session) -> Result<bool, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn visits(&self) -> Vec<Route> {
        self.visits.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &Route) {
        self.visits.lock().unwrap_or_else(PoisonError::into_inner).push(route.clone());
    }
}

// =============================================================================
// DATA STORE
// =============================================================================

fn created() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

pub fn subscription(name: &str, amount: f64, cycle: BillingCycle, next: Date) -> Subscription {
    Subscription {
        id: Uuid::new_v4(),
        user_id: user_id(),
        service_name: name.to_owned(),
        amount,
        billing_cycle: cycle,
        next_payment_date: next,
        notes: None,
        created_at: created(),
    }
}

pub fn post(title: &str, slug: &str, tags: Vec<Uuid>) -> BlogPost {
    BlogPost {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        slug: slug.to_owned(),
        summary: format!("{title} summary"),
        content: "body".to_owned(),
        thumbnail_url: None,
        author_id: Some(user_id()),
        tags,
        author: None,
        created_at: created(),
    }
}

pub fn tool(name: &str, category: Option<Uuid>) -> AiTool {
    AiTool {
        id: Uuid::new_v4(),
        name: name.to_owned(),
        description: format!("{name} does things"),
        category,
        website_url: None,
        logo_url: None,
        pricing_info: None,
        created_at: created(),
    }
}

#[derive(Default)]
pub struct Tables {
    pub profile: Option<Profile>,
    pub subscriptions: Vec<Subscription>,
    pub tags: Vec<Tag>,
    pub posts: Vec<BlogPost>,
    pub tools: Vec<AiTool>,
    pub categories: Vec<Category>,
}

/// In-memory `DataStore`. `fail_with` makes every call return that error.
#[derive(Default)]
pub struct MemoryStore {
    pub tables: Mutex<Tables>,
    pub fail_with: Mutex<Option<ApiError>>,
    pub calls: AtomicUsize,
}

impl MemoryStore {
    pub fn with(tables: Tables) -> Self {
        Self { tables: Mutex::new(tables), ..Self::default() }
    }

    pub fn failing(err: ApiError) -> Self {
        Self { fail_with: Mutex::new(Some(err)), ..Self::default() }
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<std::sync::MutexGuard<'_, Tables>, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_with.lock().unwrap_or_else(PoisonError::into_inner).clone() {
            return Err(err);
        }
        Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn profile(&self, _session: &Session) -> Result<Profile, ApiError> {
        self.enter()?.profile.clone().ok_or(ApiError::NotFound)
    }

    async fn update_username(&self, _session: &Session, username: &str) -> Result<Profile, ApiError> {
        let mut tables = self.enter()?;
        let profile = tables.profile.as_mut().ok_or(ApiError::NotFound)?;
        profile.username = Some(username.to_owned());
        Ok(profile.clone())
    }

    async fn delete_profile(&self, _session: &Session) -> Result<(), ApiError> {
        self.enter()?.profile = None;
        Ok(())
    }

    async fn list_subscriptions(&self, _session: &Session) -> Result<Vec<Subscription>, ApiError> {
        Ok(self.enter()?.subscriptions.clone())
    }

    async fn create_subscription(&self, _session: &Session, draft: &SubscriptionDraft) -> Result<Subscription, ApiError> {
        let mut tables = self.enter()?;
        let mut row = subscription(&draft.service_name, draft.amount, draft.billing_cycle, draft.next_payment_date);
        row.notes.clone_from(&draft.notes);
        tables.subscriptions.push(row.clone());
        Ok(row)
    }

    async fn update_subscription(
        &self,
        _session: &Session,
        id: Uuid,
        draft: &SubscriptionDraft,
    ) -> Result<Subscription, ApiError> {
        let mut tables = self.enter()?;
        let row = tables.subscriptions.iter_mut().find(|s| s.id == id).ok_or(ApiError::NotFound)?;
        row.service_name.clone_from(&draft.service_name);
        row.amount = draft.amount;
        row.billing_cycle = draft.billing_cycle;
        row.next_payment_date = draft.next_payment_date;
        row.notes.clone_from(&draft.notes);
        Ok(row.clone())
    }

    async fn delete_subscription(&self, _session: &Session, id: Uuid) -> Result<(), ApiError> {
        self.enter()?.subscriptions.retain(|s| s.id != id);
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>, ApiError> {
        Ok(self.enter()?.tags.clone())
    }

    async fn list_posts(&self) -> Result<Vec<BlogPost>, ApiError> {
        Ok(self.enter()?.posts.clone())
    }

    async fn post_by_slug(&self, slug: &str) -> Result<BlogPost, ApiError> {
        self.enter()?.posts.iter().find(|p| p.slug == slug).cloned().ok_or(ApiError::NotFound)
    }

    async fn admin_post(&self, _session: &Session, id: Uuid) -> Result<BlogPost, ApiError> {
        self.enter()?.posts.iter().find(|p| p.id == id).cloned().ok_or(ApiError::NotFound)
    }

    async fn create_post(&self, _session: &Session, draft: &PostDraft) -> Result<BlogPost, ApiError> {
        let mut tables = self.enter()?;
        let mut row = post(&draft.title, &draft.slug, draft.tags.clone());
        row.summary.clone_from(&draft.summary);
        row.content.clone_from(&draft.content);
        tables.posts.push(row.clone());
        Ok(row)
    }

    async fn update_post(&self, _session: &Session, id: Uuid, draft: &PostDraft) -> Result<BlogPost, ApiError> {
        let mut tables = self.enter()?;
        let row = tables.posts.iter_mut().find(|p| p.id == id).ok_or(ApiError::NotFound)?;
        row.title.clone_from(&draft.title);
        row.slug.clone_from(&draft.slug);
        row.summary.clone_from(&draft.summary);
        row.content.clone_from(&draft.content);
        row.tags.clone_from(&draft.tags);
        Ok(row.clone())
    }

    async fn delete_post(&self, _session: &Session, id: Uuid) -> Result<(), ApiError> {
        self.enter()?.posts.retain(|p| p.id != id);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<AiTool>, ApiError> {
        Ok(self.enter()?.tools.clone())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        Ok(self.enter()?.categories.clone())
    }

    async fn create_tool(&self, _session: &Session, draft: &ToolDraft) -> Result<AiTool, ApiError> {
        let mut tables = self.enter()?;
        let mut row = tool(&draft.name, Some(draft.category));
        row.description.clone_from(&draft.description);
        tables.tools.push(row.clone());
        Ok(row)
    }

    async fn update_tool(&self, _session: &Session, id: Uuid, draft: &ToolDraft) -> Result<AiTool, ApiError> {
        let mut tables = self.enter()?;
        let row = tables.tools.iter_mut().find(|t| t.id == id).ok_or(ApiError::NotFound)?;
        row.name.clone_from(&draft.name);
        row.description.clone_from(&draft.description);
        row.category = Some(draft.category);
        Ok(row.clone())
    }

    async fn delete_tool(&self, _session: &Session, id: Uuid) -> Result<(), ApiError> {
        self.enter()?.tools.retain(|t| t.id != id);
        Ok(())
    }
}

pub fn profile(is_admin: bool) -> Profile {
    Profile {
        id: user_id(),
        email: Some("ada@example.com".to_owned()),
        username: Some("ada".to_owned()),
        avatar_url: None,
        is_admin,
        created_at: created(),
    }
}

// =============================================================================
// PAGES
// =============================================================================

pub struct PageHarness {
    pub ctx: crate::pages::PageContext,
    pub data: Arc<MemoryStore>,
    pub nav: Arc<RecordingNavigator>,
}

/// Page context over a store resolved to `outcome` and the given tables.
pub async fn harness(outcome: Outcome, admin: bool, tables: Tables) -> PageHarness {
    harness_with(resolved_store(outcome).await, admin, MemoryStore::with(tables))
}

pub fn harness_with(auth: Arc<AuthStore>, admin: bool, data: MemoryStore) -> PageHarness {
    let data = Arc::new(data);
    let nav = Arc::new(RecordingNavigator::default());
    let roles: Arc<dyn RoleLookup> = Arc::new(if admin { FixedRole::admin() } else { FixedRole::member() });
    let ctx = crate::pages::PageContext::new(auth, data.clone(), roles, nav.clone(), "http://localhost:3000");
    PageHarness { ctx, data, nav }
}
