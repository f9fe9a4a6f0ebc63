//! Admin tools management: list, create, edit, and delete catalog entries.

#[cfg(test)]
#[path = "admin_tools_test.rs"]
mod admin_tools_test;

use uuid::Uuid;

use super::PageContext;
use super::tools::{CatalogData, load_catalog};
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::{Notice, Notices};
use crate::util::forms::ToolForm;

pub struct AdminToolsPage {
    ctx: PageContext,
    guard: ViewGuard<CatalogData>,
    pub notices: Notices,
}

impl AdminToolsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::AdminTools);
        Self { ctx, guard, notices: Notices::default() }
    }

    pub async fn open(&self) -> GateState<CatalogData> {
        let ctx = &self.ctx;
        let notices = &self.notices;
        self.guard
            .run(&ctx.auth, ctx.roles.as_ref(), ctx.navigator.as_ref(), |_| async move {
                Ok(load_catalog(ctx, notices).await)
            })
            .await
    }

    #[must_use]
    pub fn state(&self) -> GateState<CatalogData> {
        self.guard.state()
    }

    /// Create (`editing = None`) or update a tool from the form.
    pub async fn save(&self, editing: Option<Uuid>, form: &ToolForm) -> bool {
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
        let result = match editing {
            Some(id) => self.ctx.data.update_tool(&session, id, &draft).await.map(|_| "도구 수정 완료"),
            None => self.ctx.data.create_tool(&session, &draft).await.map(|_| "도구 추가 완료"),
        };
        match result {
            Ok(title) => {
                self.notices.push(Notice::info(title, draft.name));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("도구 저장 실패", &e));
                false
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        match self.ctx.data.delete_tool(&session, id).await {
            Ok(()) => {
                self.notices.push(Notice::info("도구 삭제 완료", "AI 도구가 삭제되었습니다."));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("도구 삭제 실패", &e));
                false
            }
        }
    }

    async fn refresh(&self) {
        let catalog = load_catalog(&self.ctx, &self.notices).await;
        self.guard.update_data(|current| *current = catalog);
    }
}
