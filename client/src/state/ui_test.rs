use super::*;

// =============================================================
// Notice
// =============================================================

#[test]
fn from_api_uses_error_text() {
    let n = Notice::from_api("구독 로드 실패", &ApiError::Transport("connection reset".into()));
    assert_eq!(n.level, NoticeLevel::Error);
    assert_eq!(n.title, "구독 로드 실패");
    assert!(n.description.contains("connection reset"));
}

#[test]
fn from_api_flags_missing_table() {
    let err = ApiError::Status { status: 500, message: "relation \"tags\" does not exist".into() };
    let n = Notice::from_api("태그 로드 실패", &err);
    assert_eq!(n.title, SCHEMA_MISSING_TITLE);
    assert!(n.description.starts_with("태그 로드 실패"));
}

// =============================================================
// Notices
// =============================================================

#[test]
fn drain_empties_in_order() {
    let notices = Notices::default();
    notices.push(Notice::info("a", ""));
    notices.push(Notice::error("b", ""));
    assert!(notices.has_errors());

    let drained: Vec<String> = notices.drain().into_iter().map(|n| n.title).collect();
    assert_eq!(drained, vec!["a", "b"]);
    assert!(notices.snapshot().is_empty());
    assert!(!notices.has_errors());
}
