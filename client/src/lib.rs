//! ChekYourSub client: session store, view guards, and page controllers
//! over the app server's HTTP API.
//!
//! ARCHITECTURE
//! ============
//! - `state::auth` owns the session lifecycle (one `AuthStore` per process).
//! - `state::gate` gates every page on that store.
//! - `net` speaks to the server; `util` is pure arithmetic and filtering.
//! - `pages` combine the three into per-screen controllers.

pub mod app;
pub mod config;
pub mod net;
pub mod pages;
pub mod routes;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
