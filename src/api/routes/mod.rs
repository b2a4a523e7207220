//! Route handlers organized by resource

pub mod backlog_items;
pub mod custom_fields;
pub mod health;
pub mod users;

use serde::{Deserialize, Serialize};

/// Body answered by a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: String,
}
