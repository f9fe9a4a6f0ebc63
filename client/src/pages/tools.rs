//! Public AI tools catalog with search and category filter.

#[cfg(test)]
#[path = "tools_test.rs"]
mod tools_test;

use super::{PageContext, list_or_empty};
use crate::net::types::{AiTool, Category};
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::Notices;
use crate::util::catalog::{CategoryFilter, category_name, filter_tools};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogData {
    pub tools: Vec<AiTool>,
    pub categories: Vec<Category>,
}

impl CatalogData {
    #[must_use]
    pub fn category_name(&self, tool: &AiTool) -> Option<String> {
        category_name(tool, &self.categories)
    }
}

/// Load tools and categories, each falling back to empty on failure.
pub(crate) async fn load_catalog(ctx: &PageContext, notices: &Notices) -> CatalogData {
    let tools = list_or_empty(notices, "도구 로드 실패", ctx.data.list_tools()).await;
    let categories = list_or_empty(notices, "카테고리 로드 실패", ctx.data.list_categories()).await;
    CatalogData { tools, categories }
}

pub struct ToolsPage {
    ctx: PageContext,
    guard: ViewGuard<CatalogData>,
    pub notices: Notices,
}

impl ToolsPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::Tools);
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
    pub fn data(&self) -> CatalogData {
        self.guard.state().data().cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn visible(&self, query: &str, category: CategoryFilter) -> Vec<AiTool> {
        let data = self.data();
        filter_tools(&data.tools, query, category).into_iter().cloned().collect()
    }
}
