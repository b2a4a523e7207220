//! In-place rewrites of denormalized data inside a backlog item.
//!
//! Each method reports whether it changed anything so callers can skip
//! writing untouched documents. None of them appends a history record.

use super::{BacklogItem, UserReference};
use crate::util::id::normalize_id;

impl BacklogItem {
    /// Detach a deleted user from this item.
    ///
    /// The assignee is removed; comment authors and history actors keep their
    /// display names but lose the id.
    pub fn clear_user_references(&mut self, user_id: &str) -> bool {
        let mut changed = false;

        if self.assignee.as_ref().is_some_and(|a| a.points_to(user_id)) {
            self.assignee = None;
            changed = true;
        }

        for comment in &mut self.comments {
            if comment.author.points_to(user_id) {
                comment.author.id = None;
                changed = true;
            }
        }

        for record in &mut self.modified_by {
            if record.change.actioned_by.points_to(user_id) {
                record.change.actioned_by.id = None;
                changed = true;
            }
        }

        changed
    }

    /// Replace every reference to `new_ref.id` with `new_ref`.
    ///
    /// A reference without an id matches nothing.
    pub fn replace_user_references(&mut self, new_ref: &UserReference) -> bool {
        let Some(user_id) = new_ref.id.as_deref().filter(|id| !id.is_empty()) else {
            return false;
        };
        let mut changed = false;

        let mut replace = |target: &mut UserReference| {
            if target.points_to(user_id) && *target != *new_ref {
                *target = new_ref.clone();
                changed = true;
            }
        };

        if let Some(assignee) = self.assignee.as_mut() {
            replace(assignee);
        }
        for comment in &mut self.comments {
            replace(&mut comment.author);
        }
        for record in &mut self.modified_by {
            replace(&mut record.change.actioned_by);
        }

        changed
    }

    /// Drop links to a deleted backlog item.
    pub fn remove_relations_to(&mut self, item_id: &str) -> bool {
        let target = normalize_id(item_id);
        let before = self.related_items.len();
        self.related_items
            .retain(|r| normalize_id(&r.related_to.id) != target);
        before != self.related_items.len()
    }

    /// Drop the value of a deleted custom field.
    pub fn remove_custom_field(&mut self, field_id: &str) -> bool {
        let target = normalize_id(field_id);
        let before = self.custom_fields.len();
        self.custom_fields.retain(|key, _| normalize_id(key) != target);
        before != self.custom_fields.len()
    }
}
