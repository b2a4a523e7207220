//! Domain commands and queries.
//!
//! Commands take the store mutably and run as one unit of work; queries
//! read through any [`DocumentRead`]. Both the HTTP API and the CLI call
//! these functions, so validation and side effects live here only.

pub mod backlog_items;
pub mod custom_fields;
pub mod user_references;
pub mod users;

use crate::config::Settings;
use crate::error::{Result, YabtError};
use crate::model::{User, UserReference};
use crate::storage::DocumentRead;
use serde::Serialize;

/// Page window limits for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingLimits {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for PagingLimits {
    fn default() -> Self {
        Self {
            default_page_size: 20,
            max_page_size: 100,
        }
    }
}

impl From<&Settings> for PagingLimits {
    fn from(settings: &Settings) -> Self {
        Self {
            default_page_size: settings.default_page_size,
            max_page_size: settings.max_page_size,
        }
    }
}

impl PagingLimits {
    /// Resolve a requested page into `(page_index, page_size)`.
    ///
    /// Page indexes are 0-based; sizes are clamped to `1..=max_page_size`.
    #[must_use]
    pub fn resolve(&self, page_index: Option<usize>, page_size: Option<usize>) -> (usize, usize) {
        let size = page_size
            .filter(|s| *s > 0)
            .unwrap_or(self.default_page_size)
            .clamp(1, self.max_page_size.max(1));
        (page_index.unwrap_or(0), size)
    }
}

/// One page of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub page_index: usize,
    pub page_size: usize,
    pub total_records: usize,
    pub total_pages: usize,
    pub entries: Vec<T>,
}

impl<T> ListResponse<T> {
    #[must_use]
    pub fn new(entries: Vec<T>, page_index: usize, page_size: usize, total_records: usize) -> Self {
        Self {
            page_index,
            page_size,
            total_records,
            total_pages: total_records.div_ceil(page_size.max(1)),
            entries,
        }
    }

    /// Page an in-memory result set.
    #[must_use]
    pub fn from_all(all: Vec<T>, page_index: usize, page_size: usize) -> Self {
        let total = all.len();
        let entries = all
            .into_iter()
            .skip(page_index.saturating_mul(page_size))
            .take(page_size)
            .collect();
        Self::new(entries, page_index, page_size, total)
    }
}

/// Resolve the acting user.
///
/// # Errors
///
/// Returns `CurrentUserRequired` when no id is given, or `UserNotFound`
/// when it does not name an existing user.
pub fn current_user(reader: &impl DocumentRead, user_id: Option<&str>) -> Result<User> {
    let user_id = user_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(YabtError::CurrentUserRequired)?;
    reader
        .load::<User>(user_id)?
        .ok_or_else(|| YabtError::UserNotFound {
            id: user_id.to_string(),
        })
}

/// The acting user's embedded reference.
///
/// # Errors
///
/// See [`current_user`].
pub fn current_user_reference(
    reader: &impl DocumentRead,
    user_id: Option<&str>,
) -> Result<UserReference> {
    current_user(reader, user_id).map(|user| user.reference())
}
