//! `yabt comment`: comments on backlog items.

use super::CommandContext;
use crate::cli::CommentCommands;
use crate::error::Result;
use crate::format::format_comments;
use crate::services::backlog_items::comments::{self, CommentAddUpdRequest};

/// Execute a comment subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the service rejects
/// the change (for example editing someone else's comment).
pub fn execute(command: &CommentCommands, ctx: &CommandContext) -> Result<()> {
    let mut store = ctx.open_existing_store()?;
    match command {
        CommentCommands::Add { item, message } => {
            let request = CommentAddUpdRequest {
                message: message.clone(),
            };
            let comment = comments::add(&mut store, ctx.actor(), item, &request)?;
            ctx.emit(&comment, || format!("Comment {} added to {item}", comment.id))
        }
        CommentCommands::Edit {
            item,
            comment,
            message,
        } => {
            let request = CommentAddUpdRequest {
                message: message.clone(),
            };
            let updated = comments::update(&mut store, ctx.actor(), item, comment, &request)?;
            ctx.emit(&updated, || format!("Comment {} updated", updated.id))
        }
        CommentCommands::Delete { item, comment } => {
            comments::delete(&mut store, ctx.actor(), item, comment)?;
            ctx.emit(&serde_json::json!({ "id": comment }), || {
                format!("Comment {comment} deleted")
            })
        }
        CommentCommands::List { item } => {
            let list = comments::list(&store, item)?;
            ctx.emit(&list, || {
                if list.is_empty() {
                    format!("No comments on {item}.")
                } else {
                    format_comments(&list)
                }
            })
        }
    }
}
