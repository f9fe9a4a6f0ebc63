//! Networking modules for the app server's HTTP API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `api` handles REST calls, `provider` adapts the auth endpoints to the
//! store's identity-provider seam, and `types` defines the wire schema.

pub mod api;
pub mod provider;
pub mod types;
