//! Client state: the auth session store, the view guard, credential
//! persistence, and user-facing notices.

pub mod auth;
pub mod credentials;
pub mod gate;
pub mod ui;
