//! Deferred patch queries.
//!
//! A patch query pairs a predicate over the `BacklogItems/ForList` index with
//! an in-memory rewrite of each matching item. Queries are queued on a
//! [`Session`] and run just before its transaction commits.

use crate::error::Result;
use crate::model::{BacklogItem, UserReference};
use crate::storage::indexes;
use crate::storage::store::{DocumentRead, Session};
use tracing::debug;

/// Name of the index the patch predicates run against.
pub const BACKLOG_ITEMS_FOR_LIST: &str = "BacklogItems/ForList";

/// Which backlog items a patch applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPredicate {
    /// `modifiedBy` contains the user, or the user is the assignee.
    TouchedByUser(String),
    /// The item links to the given item.
    RelatedTo(String),
    /// The item has a value for the given custom field.
    HasCustomField(String),
}

/// The rewrite applied to each matching item.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchAction {
    ClearUser(String),
    ReplaceUser(UserReference),
    RemoveRelationsTo(String),
    RemoveCustomField(String),
}

impl PatchAction {
    /// Apply to one item; returns whether it changed.
    pub fn apply(&self, item: &mut BacklogItem) -> bool {
        match self {
            Self::ClearUser(user_id) => item.clear_user_references(user_id),
            Self::ReplaceUser(reference) => item.replace_user_references(reference),
            Self::RemoveRelationsTo(item_id) => item.remove_relations_to(item_id),
            Self::RemoveCustomField(field_id) => item.remove_custom_field(field_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchQuery {
    pub index: &'static str,
    pub predicate: IndexPredicate,
    pub action: PatchAction,
}

impl PatchQuery {
    #[must_use]
    pub const fn new(predicate: IndexPredicate, action: PatchAction) -> Self {
        Self {
            index: BACKLOG_ITEMS_FOR_LIST,
            predicate,
            action,
        }
    }
}

/// Run one patch query inside the session's transaction.
///
/// Only items the action actually changed are written back.
/// Returns the number of patched items.
///
/// # Errors
///
/// Returns an error if the index lookup, a load or a store fails.
pub fn execute(session: &mut Session<'_>, query: &PatchQuery) -> Result<usize> {
    let ids = indexes::query_ids(session.conn(), &query.predicate)?;
    let mut patched = 0;

    for id in &ids {
        let Some(mut item) = session.load::<BacklogItem>(id)? else {
            continue;
        };
        if query.action.apply(&mut item) {
            session.store(&mut item)?;
            patched += 1;
        }
    }

    debug!(
        index = query.index,
        predicate = ?query.predicate,
        matched = ids.len(),
        patched,
        "Executed deferred patch"
    );
    Ok(patched)
}
