//! Dashboard: the signed-in user's subscriptions, cost totals, and upcoming
//! payments.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the authenticated landing route. Rows come back ordered by next
//! payment date; totals and the upcoming panel are derived client-side.

#[cfg(test)]
#[path = "dashboard_test.rs"]
mod dashboard_test;

use time::Date;
use uuid::Uuid;

use super::{PageContext, list_or_empty};
use crate::net::types::Subscription;
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::{Notice, Notices};
use crate::util::billing::{self, Totals};
use crate::util::forms::SubscriptionForm;

pub struct DashboardPage {
    ctx: PageContext,
    guard: ViewGuard<Vec<Subscription>>,
    pub notices: Notices,
}

impl DashboardPage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::Dashboard);
        Self { ctx, guard, notices: Notices::default() }
    }

    pub async fn open(&self) -> GateState<Vec<Subscription>> {
        let data = self.ctx.data.clone();
        let notices = &self.notices;
        self.guard
            .run(&self.ctx.auth, self.ctx.roles.as_ref(), self.ctx.navigator.as_ref(), |session| async move {
                let Some(session) = session else {
                    return Ok(Vec::new());
                };
                Ok(list_or_empty(notices, "구독 정보 로드 실패", data.list_subscriptions(&session)).await)
            })
            .await
    }

    #[must_use]
    pub fn state(&self) -> GateState<Vec<Subscription>> {
        self.guard.state()
    }

    #[must_use]
    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.guard.state().data().cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn totals(&self) -> Totals {
        billing::totals(&self.subscriptions())
    }

    #[must_use]
    pub fn upcoming(&self, today: Date) -> Vec<Subscription> {
        billing::upcoming(&self.subscriptions(), today)
    }

    /// Create (`editing = None`) or update a subscription from the form.
    /// Returns whether the save went through.
    pub async fn save(&self, editing: Option<Uuid>, form: &SubscriptionForm) -> bool {
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
            Some(id) => self.ctx.data.update_subscription(&session, id, &draft).await.map(|_| "구독 수정 완료"),
            None => self.ctx.data.create_subscription(&session, &draft).await.map(|_| "구독 추가 완료"),
        };
        match result {
            Ok(title) => {
                self.notices.push(Notice::info(title, draft.service_name));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("구독 저장 실패", &e));
                false
            }
        }
    }

    pub async fn delete(&self, id: Uuid) -> bool {
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        match self.ctx.data.delete_subscription(&session, id).await {
            Ok(()) => {
                self.notices.push(Notice::info("구독 삭제 완료", "구독 정보가 삭제되었습니다."));
                self.refresh().await;
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("구독 삭제 실패", &e));
                false
            }
        }
    }

    /// Re-read the list after a write.
    async fn refresh(&self) {
        let Some(session) = self.ctx.auth.get_current().session().cloned() else {
            return;
        };
        let rows = list_or_empty(&self.notices, "구독 정보 로드 실패", self.ctx.data.list_subscriptions(&session)).await;
        self.guard.update_data(|current| *current = rows);
    }

    pub fn unmount(&self) {
        self.guard.unmount();
    }
}
