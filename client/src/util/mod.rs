//! Pure helpers shared by page controllers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Nothing here performs I/O; pages feed rows in and render what comes out.

pub mod billing;
pub mod catalog;
pub mod forms;
