//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on protocol translation and auth plumbing.

pub mod auth;
pub mod blog;
pub mod error;
pub mod profile;
pub mod session;
pub mod subscription;
pub mod tools;
