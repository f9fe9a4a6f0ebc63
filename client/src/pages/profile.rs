//! Profile page: show the user's profile, rename, sign out, delete account.

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use super::{PageContext, sign_out};
use crate::net::types::Profile;
use crate::routes::Route;
use crate::state::gate::{GateState, ViewGuard};
use crate::state::ui::{Notice, Notices};
use crate::util::forms::validate_username;

pub struct ProfilePage {
    ctx: PageContext,
    guard: ViewGuard<Option<Profile>>,
    pub notices: Notices,
}

impl ProfilePage {
    #[must_use]
    pub fn new(ctx: PageContext) -> Self {
        let guard = ctx.guard(Route::Profile);
        Self { ctx, guard, notices: Notices::default() }
    }

    pub async fn open(&self) -> GateState<Option<Profile>> {
        let data = self.ctx.data.clone();
        let notices = &self.notices;
        self.guard
            .run(&self.ctx.auth, self.ctx.roles.as_ref(), self.ctx.navigator.as_ref(), |session| async move {
                let Some(session) = session else {
                    return Ok(None);
                };
                match data.profile(&session).await {
                    Ok(profile) => Ok(Some(profile)),
                    Err(e) => {
                        notices.push(Notice::from_api("프로필 로드 실패", &e));
                        Ok(None)
                    }
                }
            })
            .await
    }

    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.guard.state().data().cloned().flatten()
    }

    pub async fn rename(&self, raw: &str) -> bool {
        let username = match validate_username(raw) {
            Ok(username) => username,
            Err(_) => {
                self.notices.push(Notice::error("닉네임 필수", "닉네임을 입력해주세요."));
                return false;
            }
        };
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        match self.ctx.data.update_username(&session, &username).await {
            Ok(profile) => {
                self.guard.update_data(|current| *current = Some(profile));
                self.notices.push(Notice::info("프로필 업데이트 완료", "닉네임이 변경되었습니다."));
                true
            }
            Err(e) => {
                self.notices.push(Notice::from_api("프로필 업데이트 실패", &e));
                false
            }
        }
    }

    pub async fn sign_out(&self) {
        sign_out(&self.ctx, &self.notices).await;
    }

    /// Delete the profile row, then sign out and go home. A failed delete
    /// keeps the session.
    pub async fn delete_account(&self) -> bool {
        let Some(session) = self.ctx.session_for_action(&self.notices) else {
            return false;
        };
        if let Err(e) = self.ctx.data.delete_profile(&session).await {
            self.notices.push(Notice::from_api("계정 삭제 실패", &e));
            return false;
        }
        self.notices.push(Notice::info("계정 삭제 완료", "계정이 삭제되었습니다."));
        sign_out(&self.ctx, &self.notices).await;
        true
    }
}
