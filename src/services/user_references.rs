//! Keeps user references embedded in backlog items in step with users.
//!
//! Backlog items copy the assignee, comment authors and history actors as
//! `UserReference` values. When a user is deleted or renamed these copies
//! are rewritten by deferred patches over the `BacklogItems/ForList` index,
//! so the rewrite commits atomically with the user change.

use crate::model::UserReference;
use crate::storage::{IndexPredicate, PatchAction, PatchQuery, Session};
use crate::util::id::{id_for_dynamic_field, short_id};
use tracing::debug;

/// Queue the removal of a deleted user's id from every item it touched.
///
/// The assignee is unset; comment authors and history actors keep their
/// names with a null id.
pub fn clear_user_id(session: &mut Session<'_>, user_id: &str) {
    let sanitized = id_for_dynamic_field(user_id);
    debug!(user_id = %sanitized, "Queueing user reference clear");
    session.add_deferred_patch(PatchQuery::new(
        IndexPredicate::TouchedByUser(sanitized),
        PatchAction::ClearUser(short_id(user_id).to_string()),
    ));
}

/// Queue the replacement of every reference to `new_ref.id` with `new_ref`.
///
/// A reference without an id is ignored.
pub fn update_references(session: &mut Session<'_>, new_ref: &UserReference) {
    let Some(user_id) = new_ref.id.as_deref().filter(|id| !id.is_empty()) else {
        return;
    };
    let sanitized = id_for_dynamic_field(user_id);
    debug!(user_id = %sanitized, name = %new_ref.name, "Queueing user reference update");
    session.add_deferred_patch(PatchQuery::new(
        IndexPredicate::TouchedByUser(sanitized),
        PatchAction::ReplaceUser(new_ref.clone()),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::DocumentStore;

    #[test]
    fn empty_reference_queues_nothing() {
        let mut store = DocumentStore::open_memory().unwrap();
        let queued = store
            .mutate("noop", |session| {
                update_references(
                    session,
                    &UserReference {
                        id: Some(String::new()),
                        name: "Nobody".into(),
                        full_name: "Nobody".into(),
                    },
                );
                update_references(session, &UserReference::default());
                Ok(session.deferred_patches().len())
            })
            .unwrap();
        assert_eq!(queued, 0);
    }

    #[test]
    fn clear_queues_sanitized_predicate() {
        let mut store = DocumentStore::open_memory().unwrap();
        let queued = store
            .mutate("clear", |session| {
                clear_user_id(session, "Users/1-A'");
                Ok(session.deferred_patches().to_vec())
            })
            .unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(
            queued[0].predicate,
            IndexPredicate::TouchedByUser("1-A".into())
        );
        assert_eq!(queued[0].action, PatchAction::ClearUser("1-A'".into()));
    }
}
