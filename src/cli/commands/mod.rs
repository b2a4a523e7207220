//! Command implementations.
//!
//! Each command resolves [`Settings`], opens the document store and calls
//! the matching service. Results print as text, or as the service response
//! JSON with `--json`.

pub mod comment;
pub mod completions;
pub mod field;
pub mod item;
pub mod serve;
pub mod user;

use crate::config::Settings;
use crate::error::{Result, YabtError};
use crate::storage::DocumentStore;
use serde::Serialize;
use std::io::{self, IsTerminal};

/// Resolved settings plus output flags, shared by every command.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub settings: Settings,
    pub json: bool,
    pub quiet: bool,
    pub use_color: bool,
}

impl CommandContext {
    #[must_use]
    pub fn new(settings: Settings, json: bool, quiet: bool, no_color: bool) -> Self {
        Self {
            settings,
            json,
            quiet,
            use_color: !no_color && io::stdout().is_terminal(),
        }
    }

    /// Open the store, creating the database if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open_store(&self) -> Result<DocumentStore> {
        DocumentStore::open_with_timeout(&self.settings.db, self.settings.lock_timeout)
    }

    /// Open the store for a read-only command.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseNotFound` when the database file does not exist.
    pub fn open_existing_store(&self) -> Result<DocumentStore> {
        if !self.settings.db.exists() {
            return Err(YabtError::DatabaseNotFound {
                path: self.settings.db.clone(),
            });
        }
        self.open_store()
    }

    /// Acting user from `--user`, `YABT_CURRENT_USER` or config.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.settings.current_user.as_deref()
    }

    /// Print `value` as JSON, or `text()` otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else if !self.quiet {
            let text = text();
            if !text.is_empty() {
                println!("{text}");
            }
        }
        Ok(())
    }
}
