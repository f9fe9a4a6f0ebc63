use super::*;

#[test]
fn protected_routes_require_session() {
    for route in [Route::Dashboard, Route::Profile, Route::AdminBlog, Route::AdminTools, Route::AdminBlogNew] {
        assert!(route.access().requires_session(), "{route}");
    }
    for route in [Route::Home, Route::Tools, Route::Blog, Route::BlogPost("x".into()), Route::Auth] {
        assert!(!route.access().requires_session(), "{route}");
    }
}

#[test]
fn admin_routes_are_admin_only() {
    assert_eq!(Route::AdminBlog.access(), Access::Admin);
    assert_eq!(Route::AdminBlogEdit(Uuid::nil()).access(), Access::Admin);
    assert_eq!(Route::AdminTools.access(), Access::Admin);
    assert_eq!(Route::Auth.access(), Access::GuestOnly);
}

#[test]
fn parse_matches_path() {
    let id = Uuid::new_v4();
    for route in [
        Route::Home,
        Route::Tools,
        Route::Blog,
        Route::BlogPost("hello-world".into()),
        Route::Auth,
        Route::Dashboard,
        Route::Profile,
        Route::AdminBlog,
        Route::AdminBlogNew,
        Route::AdminBlogEdit(id),
        Route::AdminTools,
    ] {
        assert_eq!(Route::parse(&route.path()), Some(route));
    }
}

#[test]
fn parse_ignores_query_and_trailing_slash() {
    assert_eq!(Route::parse("/auth?error=access_denied"), Some(Route::Auth));
    assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
}

#[test]
fn parse_rejects_unknown_paths() {
    assert_eq!(Route::parse("/admin"), None);
    assert_eq!(Route::parse("/admin/blog/edit/not-a-uuid"), None);
    assert_eq!(Route::parse("/nope"), None);
}
