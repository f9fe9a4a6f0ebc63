//! Application route table and per-route access policy.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use uuid::Uuid;

/// Who may see a route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Public,
    /// Visible only without a session; a signed-in user is sent to the dashboard.
    GuestOnly,
    Authenticated,
    Admin,
}

impl Access {
    #[must_use]
    pub fn requires_session(self) -> bool {
        matches!(self, Self::Authenticated | Self::Admin)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Tools,
    Blog,
    BlogPost(String),
    Auth,
    Dashboard,
    Profile,
    AdminBlog,
    AdminBlogNew,
    AdminBlogEdit(Uuid),
    AdminTools,
}

impl Route {
    #[must_use]
    pub fn access(&self) -> Access {
        match self {
            Self::Home | Self::Tools | Self::Blog | Self::BlogPost(_) => Access::Public,
            Self::Auth => Access::GuestOnly,
            Self::Dashboard | Self::Profile => Access::Authenticated,
            Self::AdminBlog | Self::AdminBlogNew | Self::AdminBlogEdit(_) | Self::AdminTools => Access::Admin,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Home => "/".to_owned(),
            Self::Tools => "/tools".to_owned(),
            Self::Blog => "/blog".to_owned(),
            Self::BlogPost(slug) => format!("/blog/{slug}"),
            Self::Auth => "/auth".to_owned(),
            Self::Dashboard => "/dashboard".to_owned(),
            Self::Profile => "/profile".to_owned(),
            Self::AdminBlog => "/admin/blog".to_owned(),
            Self::AdminBlogNew => "/admin/blog/new".to_owned(),
            Self::AdminBlogEdit(id) => format!("/admin/blog/edit/{id}"),
            Self::AdminTools => "/admin/tools".to_owned(),
        }
    }

    /// Parse a path (query string ignored). Unknown paths return `None`.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Some(Self::Home),
            ["tools"] => Some(Self::Tools),
            ["blog"] => Some(Self::Blog),
            ["blog", slug] => Some(Self::BlogPost((*slug).to_owned())),
            ["auth"] => Some(Self::Auth),
            ["dashboard"] => Some(Self::Dashboard),
            ["profile"] => Some(Self::Profile),
            ["admin", "blog"] => Some(Self::AdminBlog),
            ["admin", "blog", "new"] => Some(Self::AdminBlogNew),
            ["admin", "blog", "edit", id] => Uuid::parse_str(id).ok().map(Self::AdminBlogEdit),
            ["admin", "tools"] => Some(Self::AdminTools),
            _ => None,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}
