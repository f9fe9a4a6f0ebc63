use uuid::Uuid;

use super::*;
use crate::net::api::ApiError;
use crate::test_support::{MemoryStore, Outcome, Tables, harness, harness_with, resolved_store, session, tool};

#[tokio::test]
async fn catalog_filters_by_category() {
    let video = Category { id: Uuid::new_v4(), name: "Video".into() };
    let tables = Tables {
        tools: vec![tool("Runway", Some(video.id)), tool("Jasper", None)],
        categories: vec![video.clone()],
        ..Tables::default()
    };
    let h = harness(Outcome::Session(session()), false, tables).await;
    let page = ToolsPage::new(h.ctx);
    page.open().await;

    assert_eq!(page.visible("", CategoryFilter::All).len(), 2);
    let only_video = page.visible("", CategoryFilter::Only(video.id));
    assert_eq!(only_video.len(), 1);
    assert_eq!(page.data().category_name(&only_video[0]), Some("Video".to_owned()));
}

#[tokio::test]
async fn failed_reads_leave_empty_catalog() {
    let h = harness_with(resolved_store(Outcome::NoSession).await, false, MemoryStore::failing(ApiError::NotFound));
    let page = ToolsPage::new(h.ctx);
    assert_eq!(page.open().await, GateState::Ready(CatalogData::default()));
    assert_eq!(page.notices.drain().len(), 2);
}
