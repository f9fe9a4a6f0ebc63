use super::*;
use crate::net::types::Category;
use crate::test_support::{Outcome, Tables, harness, session, tool};

fn form(name: &str, category: Uuid) -> ToolForm {
    ToolForm {
        name: name.into(),
        description: "writes copy".into(),
        category: category.to_string(),
        ..ToolForm::default()
    }
}

#[tokio::test]
async fn member_is_redirected_before_any_fetch() {
    let h = harness(Outcome::Session(session()), false, Tables::default()).await;
    let (data, nav) = (h.data.clone(), h.nav.clone());
    let page = AdminToolsPage::new(h.ctx);

    assert_eq!(page.open().await, GateState::Redirecting(Route::Dashboard));
    assert_eq!(nav.visits(), vec![Route::Dashboard]);
    assert_eq!(data.count(), 0);
}

#[tokio::test]
async fn admin_creates_updates_deletes() {
    let cat = Category { id: Uuid::new_v4(), name: "Writing".into() };
    let tables = Tables { tools: vec![tool("Old", Some(cat.id))], categories: vec![cat.clone()], ..Tables::default() };
    let h = harness(Outcome::Session(session()), true, tables).await;
    let page = AdminToolsPage::new(h.ctx);
    page.open().await;

    assert!(page.save(None, &form("Jasper", cat.id)).await);
    let tools = page.state().data().map(|d| d.tools.clone()).unwrap_or_default();
    assert_eq!(tools.len(), 2);

    let jasper = tools.iter().find(|t| t.name == "Jasper").map(|t| t.id).unwrap();
    assert!(page.save(Some(jasper), &form("Jasper AI", cat.id)).await);
    assert!(page.delete(tools[0].id).await);

    let names: Vec<String> =
        page.state().data().map(|d| d.tools.iter().map(|t| t.name.clone()).collect()).unwrap_or_default();
    assert_eq!(names, vec!["Jasper AI".to_owned()]);
}

#[tokio::test]
async fn incomplete_form_is_rejected() {
    let h = harness(Outcome::Session(session()), true, Tables::default()).await;
    let page = AdminToolsPage::new(h.ctx);
    page.open().await;
    assert!(!page.save(None, &ToolForm { name: "x".into(), ..ToolForm::default() }).await);
    assert!(page.notices.has_errors());
}
