use super::*;

#[test]
fn endpoint_joins_without_double_slash() {
    assert_eq!(endpoint("http://localhost:3000/", "/api/tools"), "http://localhost:3000/api/tools");
    assert_eq!(endpoint("http://localhost:3000", "/api/tools"), "http://localhost:3000/api/tools");
}

#[test]
fn post_slug_url_keeps_ascii_slug() {
    let url = post_slug_url("http://localhost:3000/", "hello-world").unwrap();
    assert_eq!(url.as_str(), "http://localhost:3000/api/blog/posts/hello-world");
}

#[test]
fn post_slug_url_encodes_one_segment() {
    // "가" is EA B0 80 in UTF-8.
    let url = post_slug_url("http://localhost:3000", "가").unwrap();
    assert_eq!(url.as_str(), "http://localhost:3000/api/blog/posts/%EA%B0%80");
    let url = post_slug_url("http://localhost:3000", "a/b c").unwrap();
    assert_eq!(url.as_str(), "http://localhost:3000/api/blog/posts/a%2Fb%20c");
}

#[test]
fn post_slug_url_rejects_bad_base() {
    assert!(matches!(post_slug_url("not a url", "x"), Err(ApiError::Transport(_))));
}

#[test]
fn sign_in_url_points_at_provider_route() {
    let api = ApiClient::new("https://chekyoursub.app/");
    assert_eq!(api.sign_in_url("kakao"), "https://chekyoursub.app/auth/kakao");
}

#[test]
fn status_error_maps_auth_statuses() {
    assert_eq!(status_error(401, String::new()), ApiError::Unauthorized);
    assert_eq!(status_error(403, String::new()), ApiError::Forbidden);
    assert_eq!(status_error(404, String::new()), ApiError::NotFound);
}

#[test]
fn status_error_keeps_message_for_other_statuses() {
    let err = status_error(500, "boom".into());
    assert_eq!(err, ApiError::Status { status: 500, message: "boom".into() });
}

#[test]
fn schema_missing_detected_from_message() {
    let err = ApiError::Status { status: 503, message: r#"relation "subscriptions" does not exist"#.into() };
    assert!(err.is_schema_missing());
}

#[test]
fn schema_missing_false_for_other_errors() {
    assert!(!ApiError::Transport("relation does not exist".into()).is_schema_missing());
    assert!(!ApiError::Status { status: 500, message: "database error".into() }.is_schema_missing());
}
