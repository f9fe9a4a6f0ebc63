//! Public blog: the post list with search and tag filter, and single posts.

#[cfg(test)]
#[path = "blog_test.rs"]
mod blog_test;

use uuid::Uuid;

use super::{PageContext, list_or_empty};
use crate::net::types::{BlogPost, Tag};
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::{Notice, Notices};
use crate::util::catalog::{filter_posts, tag_names};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlogData {
    pub posts: Vec<BlogPost>,
    pub tags: Vec<Tag>,
}

impl BlogData {
    #[must_use]
    pub fn tag_names(&self, post: &BlogPost) -> Vec<String> {
        tag_names(post, &self.tags)
    }
}

pub struct BlogPage {
    ctx: PageContext,
    guard: ViewGuard<BlogData>,
    pub notices: Notices,
}

impl BlogPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::Blog);
        Self { ctx, guard, notices: Notices::default() }
    }

    pub async fn open(&self) -> GateState<BlogData> {
        let data = self.ctx.data.clone();
        let notices = &self.notices;
        self.guard
            .run(&self.ctx.auth, self.ctx.roles.as_ref(), self.ctx.navigator.as_ref(), |_| async move {
                let posts = list_or_empty(notices, "블로그 게시글 로드 실패", data.list_posts()).await;
                let tags = list_or_empty(notices, "태그 로드 실패", data.list_tags()).await;
                Ok(BlogData { posts, tags })
            })
            .await
    }

    #[must_use]
    pub fn data(&self) -> BlogData {
        self.guard.state().data().cloned().unwrap_or_default()
    }

    /// Posts matching the search box and the selected tag.
    #[must_use]
    pub fn visible(&self, query: &str, tag: Option<Uuid>) -> Vec<BlogPost> {
        let data = self.data();
        filter_posts(&data.posts, query, tag).into_iter().cloned().collect()
    }
}

pub struct BlogPostPage {
    ctx: PageContext,
    guard: ViewGuard<Option<BlogPost>>,
    slug: String,
    pub notices: Notices,
}

impl BlogPostPage {
    #[must_use]
    pub fn new(ctx: PageContext, slug: impl Into<String>) -> Self {
        let slug = slug.into();
        let guard = ctx.guard(Route::BlogPost(slug.clone()));
        Self { ctx, guard, slug, notices: Notices::default() }
    }

    /// Load the post; an unknown or unreadable post sends the user back to
    /// the list.
    pub async fn open(&self) -> GateState<Option<BlogPost>> {
        let data = self.ctx.data.clone();
        let notices = &self.notices;
        let slug = self.slug.as_str();
        let state = self
            .guard
            .run(&self.ctx.auth, self.ctx.roles.as_ref(), self.ctx.navigator.as_ref(), |_| async move {
                match data.post_by_slug(slug).await {
                    Ok(post) => Ok(Some(post)),
                    Err(e) => {
                        tracing::warn!(slug, error = %e, "post lookup failed");
                        notices.push(Notice::from_api("게시글 로드 실패", &e));
                        Ok(None)
                    }
                }
            })
            .await;
        if matches!(state, GateState::Ready(None)) {
            self.ctx.navigator.navigate(&Route::Blog);
        }
        state
    }

    #[must_use]
    pub fn post(&self) -> Option<BlogPost> {
        self.guard.state().data().cloned().flatten()
    }
}
