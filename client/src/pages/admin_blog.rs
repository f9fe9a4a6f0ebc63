//! Admin blog management: the post list with delete, and the post editor
//! used for both new and existing posts.

#[cfg(test)]
#[path = "admin_blog_test.rs"]
mod admin_blog_test;

use uuid::Uuid;

use super::blog::BlogData;
use super::{PageContext, list_or_empty};
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::{Notice, Notices};
use crate::util::forms::PostForm;

// =============================================================================
// POST LIST
// =============================================================================

pub struct AdminBlogPage {
    ctx: PageContext,
    guard: ViewGuard<BlogData>,
    pub notices: Notices,
}

impl AdminBlogPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::AdminBlog);
        Self { ctx, guard, notices: Notices::default() }
    }

    pub async fn open(&self) -> GateState<BlogData> {
        let ctx = &self.ctx;
        let notices = &self.notices;
        self.guard
            .run(&ctx.auth, ctx.roles.as_ref(), ctx.navigator.as_ref(), |_| async move {
                let posts = list_or_empty(notices, "게시글 로드 실패", ctx.data.list_posts()).await;
                let tags = list_or_empty(notices, "태그 로드 실패", ctx.data.list_tags()).await;
                Ok(BlogData { posts, tags })
            })
            .await
    }

    #[must_use]
    pub fn state(&self) -> GateState<BlogData> {
        self.guard.state()
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        match self.ctx.data.delete_post(&session, id).await {
            Ok(()) => {
                self.guard.update_data(|data| data.posts.retain(|p| p.id != id));
                self.notices.push(Notice::info("게시글 삭제 완료", "블로그 게시글이 삭제되었습니다."));
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("게시글 삭제 실패", &e));
                false
            }
        }
    }

    /// Open the editor for a new post.
    pub fn new_post(&self) {
        self.ctx.navigator.navigate(&Route::AdminBlogNew);
    }

    pub fn edit_post(&self, id: Uuid) {
        self.ctx.navigator.navigate(&Route::AdminBlogEdit(id));
    }
}

// =============================================================================
// POST EDITOR
// =============================================================================

/// Editor contents: every known tag plus the form (pre-filled when editing).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorData {
    pub tags: Vec<crate::net::types::Tag>,
    pub form: PostForm,
}

pub struct PostEditorPage {
    ctx: PageContext,
    editing: Option<Uuid>,
    guard: ViewGuard<Option<EditorData>>,
    pub notices: Notices,
}

impl PostEditorPage {
    #[must_use]
    pub fn create(ctx: PageContext) -> Self {
        Self::build(ctx, None)
    }

    #[must_use]
    pub fn edit(ctx: PageContext, id: Uuid) -> Self {
        Self::build(ctx, Some(id))
    }

    fn build(ctx: PageContext, editing: Option<Uuid>) -> Self {
        let route = editing.map_or(Route::AdminBlogNew, Route::AdminBlogEdit);
        let guard = ctx.guard(route);
        Self { ctx, editing, guard, notices: Notices::default() }
    }

    /// Load tags (and the post when editing). A post that cannot be read
    /// sends the editor back to the list.
    pub async fn open(&self) -> GateState<Option<EditorData>> {
        let ctx = &self.ctx;
        let notices = &self.notices;
        let editing = self.editing;
        let state = self
            .guard
            .run(&ctx.auth, ctx.roles.as_ref(), ctx.navigator.as_ref(), |session| async move {
                let tags = list_or_empty(notices, "태그 로드 실패", ctx.data.list_tags()).await;
                let (Some(id), Some(session)) = (editing, session) else {
                    return Ok(Some(EditorData { tags, form: PostForm::default() }));
                };
                match ctx.data.admin_post(&session, id).await {
                    Ok(post) => Ok(Some(EditorData { tags, form: PostForm::from_row(&post) })),
                    Err(e) => {
                        notices.push(Notice::from_api("게시글 로드 실패", &e));
                        Ok(None)
                    }
                }
            })
            .await;
        if matches!(state, GateState::Ready(None)) {
            self.ctx.navigator.navigate(&Route::AdminBlog);
        }
        state
    }

    #[must_use]
    pub fn state(&self) -> GateState<Option<EditorData>> {
        self.guard.state()
    }

    /// Validate and save, then return to the list.
    pub async fn submit(&self, form: &PostForm) -> bool {
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(e) => {
                self.notices.push(Notice::error("필수 항목 누락", e.to_string()));
                return false;
            }
        };
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        let result = match self.editing {
            Some(id) => self.ctx.data.update_post(&session, id, &draft).await.map(|_| "게시글 수정 완료"),
            None => self.ctx.data.create_post(&session, &draft).await.map(|_| "게시글 작성 완료"),
        };
        match result {
            Ok(title) => {
                self.notices.push(Notice::info(title, draft.title));
                self.ctx.navigator.navigate(&Route::AdminBlog);
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("게시글 저장 실패", &e));
                false
            }
        }
    }
}
