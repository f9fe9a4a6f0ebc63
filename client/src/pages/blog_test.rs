use super::*;
use crate::test_support::{Outcome, Tables, harness, post};

fn tables(tag: &Tag) -> Tables {
    Tables {
        posts: vec![post("Claude 사용기", "claude", vec![tag.id]), post("Cursor tips", "cursor", vec![])],
        tags: vec![tag.clone()],
        ..Tables::default()
    }
}

#[tokio::test]
async fn list_is_public_and_filterable() {
    let tag = Tag { id: Uuid::new_v4(), name: "LLM".into() };
    let h = harness(Outcome::NoSession, false, tables(&tag)).await;
    let page = BlogPage::new(h.ctx);

    let state = page.open().await;
    assert_eq!(state.data().map(|d| d.posts.len()), Some(2));
    assert_eq!(page.visible("cursor", None).len(), 1);
    assert_eq!(page.visible("", Some(tag.id))[0].slug, "claude");

    let data = page.data();
    assert_eq!(data.tag_names(&data.posts[0]), vec!["LLM".to_owned()]);
}

#[tokio::test]
async fn post_by_slug() {
    let tag = Tag { id: Uuid::new_v4(), name: "LLM".into() };
    let h = harness(Outcome::NoSession, false, tables(&tag)).await;
    let nav = h.nav.clone();
    let page = BlogPostPage::new(h.ctx, "cursor");

    page.open().await;
    assert_eq!(page.post().map(|p| p.title), Some("Cursor tips".to_owned()));
    assert!(nav.visits().is_empty());
}

#[tokio::test]
async fn unknown_slug_returns_to_list() {
    let h = harness(Outcome::NoSession, false, Tables::default()).await;
    let nav = h.nav.clone();
    let page = BlogPostPage::new(h.ctx, "missing");

    assert_eq!(page.open().await, GateState::Ready(None));
    assert_eq!(nav.visits(), vec![Route::Blog]);
    assert!(page.notices.has_errors());
}
