//! Comments on backlog items.
//!
//! Only a comment's author may edit or delete it. Each change appends a
//! history record, so every author is also listed in `modifiedBy`.

use super::load_item;
use crate::error::{Result, YabtError};
use crate::model::{BacklogItem, Comment, UserReference};
use crate::services::current_user_reference;
use crate::storage::{DocumentRead, DocumentStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub const MAX_MESSAGE_LENGTH: usize = 5000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentAddUpdRequest {
    pub message: String,
}

fn validate_message(message: &str) -> Result<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(YabtError::validation("message", "cannot be empty"));
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(YabtError::validation(
            "message",
            format!("cannot exceed {MAX_MESSAGE_LENGTH} characters"),
        ));
    }
    Ok(message.to_string())
}

fn authored_comment<'a>(
    item: &'a mut BacklogItem,
    comment_id: &str,
    actor: &UserReference,
) -> Result<&'a mut Comment> {
    let item_id = item.id.clone();
    let comment = item
        .comments
        .iter_mut()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| YabtError::CommentNotFound {
            item_id,
            comment_id: comment_id.to_string(),
        })?;

    let is_author = actor
        .id
        .as_deref()
        .is_some_and(|id| comment.author.points_to(id));
    if !is_author {
        return Err(YabtError::Forbidden {
            reason: "only the author can change a comment".to_string(),
        });
    }
    Ok(comment)
}

/// # Errors
///
/// Returns `BacklogItemNotFound`, `CurrentUserRequired` or a validation error.
pub fn add(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    request: &CommentAddUpdRequest,
) -> Result<Comment> {
    let comment = store.mutate("add_comment", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let message = validate_message(&request.message)?;
        let mut item = load_item(session, item_id)?;

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4().simple().to_string(),
            message,
            author: actor.clone(),
            created: now,
            last_modified: now,
        };
        item.comments.push(comment.clone());
        item.add_history_record(&actor, "Added a comment");
        session.store(&mut item)?;
        Ok(comment)
    })?;
    info!(item_id, comment_id = %comment.id, "Added comment");
    Ok(comment)
}

/// # Errors
///
/// Returns `BacklogItemNotFound`, `CommentNotFound`, `Forbidden` for a
/// comment by someone else, `CurrentUserRequired` or a validation error.
pub fn update(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    comment_id: &str,
    request: &CommentAddUpdRequest,
) -> Result<Comment> {
    store.mutate("update_comment", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let message = validate_message(&request.message)?;
        let mut item = load_item(session, item_id)?;

        let comment = authored_comment(&mut item, comment_id, &actor)?;
        comment.message = message;
        comment.last_modified = Utc::now();
        let updated = comment.clone();

        item.add_history_record(&actor, "Updated a comment");
        session.store(&mut item)?;
        Ok(updated)
    })
}

/// # Errors
///
/// Returns `BacklogItemNotFound`, `CommentNotFound`, `Forbidden` for a
/// comment by someone else, or `CurrentUserRequired`.
pub fn delete(
    store: &mut DocumentStore,
    actor_id: Option<&str>,
    item_id: &str,
    comment_id: &str,
) -> Result<()> {
    store.mutate("delete_comment", |session| {
        let actor = current_user_reference(session, actor_id)?;
        let mut item = load_item(session, item_id)?;

        authored_comment(&mut item, comment_id, &actor)?;
        item.comments.retain(|c| c.id != comment_id);
        item.add_history_record(&actor, "Deleted a comment");
        session.store(&mut item)?;
        Ok(())
    })?;
    info!(item_id, comment_id, "Deleted comment");
    Ok(())
}

/// Comments of an item, newest first.
///
/// # Errors
///
/// Returns `BacklogItemNotFound` when there is no such item.
pub fn list(reader: &impl DocumentRead, item_id: &str) -> Result<Vec<Comment>> {
    let mut comments = load_item(reader, item_id)?.comments;
    comments.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_trimmed_and_required() {
        assert_eq!(validate_message("  hi  ").unwrap(), "hi");
        assert!(validate_message("   ").is_err());
        assert!(validate_message(&"x".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }
}
