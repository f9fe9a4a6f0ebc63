use super::*;
use crate::net::provider::ProviderError;
use crate::state::auth::AuthState;
use crate::state::ui::NoticeLevel;
use crate::test_support::{MockProvider, Outcome, Tables, harness, harness_with, session, store_with};

#[tokio::test]
async fn list_or_empty_swallows_errors_into_notice() {
    let notices = Notices::default();
    let rows: Vec<u8> = list_or_empty(&notices, "로드 실패", async { Err(ApiError::Transport("x".into())) }).await;
    assert!(rows.is_empty());
    assert_eq!(notices.drain()[0].level, NoticeLevel::Error);

    let rows = list_or_empty(&notices, "로드 실패", async { Ok::<_, ApiError>(vec![1, 2]) }).await;
    assert_eq!(rows, vec![1, 2]);
    assert!(notices.drain().is_empty());
}

#[tokio::test]
async fn sign_out_goes_home() {
    let h = harness(Outcome::Session(session()), false, Tables::default()).await;
    let notices = Notices::default();
    sign_out(&h.ctx, &notices).await;
    assert_eq!(h.ctx.auth.get_current(), AuthState::Absent);
    assert_eq!(h.nav.visits(), vec![Route::Home]);
    assert!(notices.drain().is_empty());
}

#[tokio::test]
async fn sign_out_provider_failure_still_signs_out() {
    let provider = MockProvider::new(Outcome::Session(session()))
        .failing_sign_out(ProviderError::Unreachable("offline".into()));
    let (store, _, _) = store_with(provider);
    store.initialize().await;
    let h = harness_with(store, false, crate::test_support::MemoryStore::default());
    let notices = Notices::default();

    sign_out(&h.ctx, &notices).await;

    assert_eq!(h.ctx.auth.get_current(), AuthState::Absent);
    assert_eq!(notices.drain().len(), 1);
}
