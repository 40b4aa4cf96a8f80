//! Core library surface for the Student Registry TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the MongoDB-backed record store, the domain model, and the
//! interactive front-end.
pub mod db;
pub mod models;
pub mod ui;

/// Convenience re-exports for the persistence layer. These are typically
/// used by `main.rs` to resolve configuration and open the one connection
/// the process holds.
pub use db::{Store, StoreConfig, StoreError};

/// The domain types other layers manipulate.
pub use models::{Student, StudentFields};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
