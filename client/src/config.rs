//! Client configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_INIT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_VIEW_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CREDENTIALS_FILE: &str = ".chekyoursub/credentials.json";

/// Whether a sign-in survives a restart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPersistence {
    /// Credential written to a JSON file.
    Persistent(PathBuf),
    /// Credential kept in memory only.
    Ephemeral,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub init_timeout: Duration,
    pub view_timeout: Duration,
    pub persistence: SessionPersistence,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ClientConfig {
    /// Build config from the process environment.
    ///
    /// Optional:
    /// - `CYS_BASE_URL`: app server URL, default `http://localhost:3000`
    /// - `CYS_INIT_TIMEOUT_MS`: store resolution timeout, default 5000
    /// - `CYS_VIEW_TIMEOUT_MS`: per-view resolution timeout, default 5000
    /// - `CYS_CREDENTIALS`: credential file path, default `$HOME/.chekyoursub/credentials.json`
    /// - `CYS_EPHEMERAL`: `true` keeps the session in memory only
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup("CYS_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim_end_matches('/')
            .to_owned();
        let millis = |key: &str, default: u64| {
            Duration::from_millis(lookup(key).and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(default))
        };
        let ephemeral = lookup("CYS_EPHEMERAL").is_some_and(|v| parse_bool(&v));
        let persistence = if ephemeral {
            SessionPersistence::Ephemeral
        } else {
            let path = lookup("CYS_CREDENTIALS").map(PathBuf::from).unwrap_or_else(|| {
                lookup("HOME").map_or_else(|| PathBuf::from(DEFAULT_CREDENTIALS_FILE), |home| {
                    PathBuf::from(home).join(DEFAULT_CREDENTIALS_FILE)
                })
            });
            SessionPersistence::Persistent(path)
        };

        Self {
            base_url,
            init_timeout: millis("CYS_INIT_TIMEOUT_MS", DEFAULT_INIT_TIMEOUT_MS),
            view_timeout: millis("CYS_VIEW_TIMEOUT_MS", DEFAULT_VIEW_TIMEOUT_MS),
            persistence,
        }
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
