//! User-facing notices (the toast queue).
//!
//! DESIGN
//! ======
//! Pages never surface raw errors. Every caught failure or completed action
//! becomes a `Notice`, and the host decides how to show it (toast, stderr,
//! test assertion).

#[cfg(test)]
#[path = "ui_test.rs"]
mod ui_test;

use std::sync::{Mutex, PoisonError};

use crate::net::api::ApiError;

pub const SCHEMA_MISSING_TITLE: &str = "데이터베이스 설정 필요";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoticeLevel {
    #[default]
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, title: title.into(), description: description.into() }
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, title: title.into(), description: description.into() }
    }

    /// Notice for a failed data call. A missing table gets its own wording
    /// so operators know to run migrations rather than retry.
    #[must_use]
    pub fn from_api(title: &str, err: &ApiError) -> Self {
        if err.is_schema_missing() {
            Self::error(SCHEMA_MISSING_TITLE, format!("{title}: 필요한 테이블이 아직 생성되지 않았습니다."))
        } else {
            Self::error(title, err.to_string())
        }
    }
}

/// Append-only notice queue shared by a page and its host.
#[derive(Debug, Default)]
pub struct Notices {
    queue: Mutex<Vec<Notice>>,
}

impl Notices {
    pub fn push(&self, notice: Notice) {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).push(notice);
    }

    /// Take every pending notice, oldest first.
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notice> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).iter().any(|n| n.level == NoticeLevel::Error)
    }
}
