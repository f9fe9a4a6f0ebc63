use super::*;
use axum::http::{Request, header};
use uuid::Uuid;

// =============================================================================
// request_token
// =============================================================================

fn parts(headers: &[(header::HeaderName, &str)]) -> Parts {
    let mut builder = Request::builder().uri("/api/profile");
    for (name, value) in headers {
        builder = builder.header(name, *value);
    }
    builder.body(()).unwrap().into_parts().0
}

#[test]
fn request_token_prefers_bearer() {
    let p = parts(&[(header::AUTHORIZATION, "Bearer abc123"), (header::COOKIE, "session_token=cookie456")]);
    assert_eq!(request_token(&p).as_deref(), Some("abc123"));
}

#[test]
fn request_token_falls_back_to_cookie() {
    let p = parts(&[(header::COOKIE, "other=1; session_token=cookie456")]);
    assert_eq!(request_token(&p).as_deref(), Some("cookie456"));
}

#[test]
fn request_token_ignores_other_schemes_and_blanks() {
    assert_eq!(request_token(&parts(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")])), None);
    assert_eq!(request_token(&parts(&[(header::AUTHORIZATION, "Bearer   ")])), None);
    assert_eq!(request_token(&parts(&[(header::COOKIE, "session_token=")])), None);
    assert_eq!(request_token(&parts(&[])), None);
}

// =============================================================================
// redirects
// =============================================================================

fn location(redirect: Redirect) -> String {
    redirect.into_response().headers()[header::LOCATION].to_str().unwrap().to_owned()
}

#[test]
fn auth_error_redirect_passes_simple_codes() {
    assert_eq!(location(auth_error_redirect("access_denied")), "/auth?error=access_denied");
}

#[test]
fn auth_error_redirect_strips_unsafe_characters() {
    assert_eq!(location(auth_error_redirect("bad&next=//evil")), "/auth?error=badnextevil");
    assert_eq!(location(auth_error_redirect("!!!")), "/auth?error=oauth_failed");
}

#[test]
fn dashboard_redirect_carries_tokens_in_fragment() {
    let issued = IssuedSession {
        access_token: "acc".into(),
        refresh_token: "ref".into(),
        user: session::SessionUser {
            id: Uuid::nil(),
            email: None,
            provider: "kakao".into(),
            username: None,
            avatar_url: None,
        },
        issued_at: time::OffsetDateTime::UNIX_EPOCH,
        expires_at: time::OffsetDateTime::UNIX_EPOCH,
    };
    assert_eq!(location(dashboard_redirect(&issued)), "/dashboard#access_token=acc&refresh_token=ref");
}

// =============================================================================
// refresh_token_from
// =============================================================================

#[test]
fn refresh_token_from_body() {
    let jar = CookieJar::new();
    assert_eq!(refresh_token_from(br#"{"refresh_token":"r1"}"#, &jar).as_deref(), Some("r1"));
}

#[test]
fn refresh_token_from_cookie_when_body_empty() {
    let jar = CookieJar::new().add(Cookie::new(REFRESH_COOKIE_NAME, "r2"));
    assert_eq!(refresh_token_from(b"", &jar).as_deref(), Some("r2"));
    assert_eq!(refresh_token_from(b" \n", &jar).as_deref(), Some("r2"));
}

#[test]
fn refresh_token_from_rejects_malformed_body() {
    let jar = CookieJar::new().add(Cookie::new(REFRESH_COOKIE_NAME, "r2"));
    assert_eq!(refresh_token_from(b"not json", &jar), None);
    assert_eq!(refresh_token_from(br#"{"refresh_token":"  "}"#, &jar), None);
}
