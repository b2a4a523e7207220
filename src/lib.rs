//! yabt: a backlog tracker backend.
//!
//! Backlog items, users and custom field definitions are JSON documents in
//! a SQLite-backed document store. User references are denormalized into
//! backlog items; renaming or deleting a user rewrites them through deferred
//! patches that run inside the same unit of work.
//!
//! The [`services`] layer is shared by the HTTP [`api`] and the [`cli`].

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod model;
pub mod services;
pub mod storage;
pub mod util;

pub use error::{ErrorCode, Result, StructuredError, YabtError};
