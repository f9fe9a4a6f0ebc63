use super::*;
use crate::net::types::Tag;
use crate::test_support::{Outcome, Tables, harness, post, session};

fn tables() -> Tables {
    Tables {
        posts: vec![post("First", "first", vec![])],
        tags: vec![Tag { id: Uuid::new_v4(), name: "LLM".into() }],
        ..Tables::default()
    }
}

// =============================================================
// AdminBlogPage
// =============================================================

#[tokio::test]
async fn non_admin_never_fetches_admin_data() {
    let h = harness(Outcome::Session(session()), false, tables()).await;
    let (data, nav) = (h.data.clone(), h.nav.clone());
    let page = AdminBlogPage::new(h.ctx);

    assert_eq!(page.open().await, GateState::Redirecting(Route::Dashboard));
    assert_eq!(nav.visits(), vec![Route::Dashboard]);
    assert_eq!(data.count(), 0);
}

#[tokio::test]
async fn signed_out_goes_to_auth_not_dashboard() {
    let h = harness(Outcome::NoSession, true, tables()).await;
    let nav = h.nav.clone();
    let page = AdminBlogPage::new(h.ctx);
    assert_eq!(page.open().await, GateState::Redirecting(Route::Auth));
    assert_eq!(nav.visits(), vec![Route::Auth]);
}

#[tokio::test]
async fn admin_lists_and_deletes() {
    let h = harness(Outcome::Session(session()), true, tables()).await;
    let page = AdminBlogPage::new(h.ctx);
    let state = page.open().await;
    let id = state.data().map(|d| d.posts[0].id).unwrap();

    assert!(page.delete(id).await);
    assert_eq!(page.state().data().map(|d| d.posts.len()), Some(0));
}

// =============================================================
// PostEditorPage
// =============================================================

#[tokio::test]
async fn new_post_flow() {
    let h = harness(Outcome::Session(session()), true, tables()).await;
    let (data, nav) = (h.data.clone(), h.nav.clone());
    let editor = PostEditorPage::create(h.ctx);

    let state = editor.open().await;
    let mut form = state.data().cloned().flatten().map(|d| d.form).unwrap();
    assert!(!editor.submit(&form).await);

    form.set_title("Second Post");
    form.summary = "short".into();
    form.content = "long".into();
    assert!(editor.submit(&form).await);

    assert_eq!(nav.visits(), vec![Route::AdminBlog]);
    let slugs: Vec<String> = data.tables.lock().unwrap().posts.iter().map(|p| p.slug.clone()).collect();
    assert_eq!(slugs, vec!["first".to_owned(), "second-post".to_owned()]);
}

#[tokio::test]
async fn edit_prefills_form() {
    let t = tables();
    let id = t.posts[0].id;
    let h = harness(Outcome::Session(session()), true, t).await;
    let editor = PostEditorPage::edit(h.ctx, id);

    let state = editor.open().await;
    let data = state.data().cloned().flatten().unwrap();
    assert_eq!(data.form.slug, "first");
    assert_eq!(data.tags.len(), 1);
}

#[tokio::test]
async fn edit_of_missing_post_returns_to_list() {
    let h = harness(Outcome::Session(session()), true, tables()).await;
    let nav = h.nav.clone();
    let editor = PostEditorPage::edit(h.ctx, Uuid::new_v4());

    assert_eq!(editor.open().await, GateState::Ready(None));
    assert_eq!(nav.visits(), vec![Route::AdminBlog]);
}
