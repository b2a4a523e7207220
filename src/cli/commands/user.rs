//! `yabt user`: user commands.

use super::CommandContext;
use crate::cli::{UserCommands, UserFieldsArgs, UserListArgs};
use crate::error::{Result, YabtError};
use crate::format::{format_user_details, format_user_line};
use crate::services::PagingLimits;
use crate::services::users::{self, UserAddUpdRequest, UserListGetRequest, UserOrderBy};
use crate::storage::OrderDirection;

/// Execute a user subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the service rejects
/// the change.
pub fn execute(command: &UserCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        UserCommands::Add(fields) => {
            let request = UserAddUpdRequest {
                first_name: fields.first_name.clone().unwrap_or_default(),
                last_name: fields.last_name.clone().unwrap_or_default(),
                email: fields
                    .email
                    .clone()
                    .ok_or_else(|| YabtError::validation("email", "is required"))?,
                avatar_url: fields.avatar.clone(),
            };
            let mut store = ctx.open_store()?;
            let user = users::create(&mut store, &request)?;
            ctx.emit(&user, || format!("Created user {}: {}", user.id, user.full_name))
        }
        UserCommands::Update { id, fields } => {
            let mut store = ctx.open_existing_store()?;
            let current = users::get(&store, id)?;
            let request = merge_update(
                UserAddUpdRequest {
                    first_name: current.first_name,
                    last_name: current.last_name,
                    email: current.email,
                    avatar_url: current.avatar_url,
                },
                fields,
            );
            let user = users::update(&mut store, id, &request)?;
            ctx.emit(&user, || format!("Updated user {}: {}", user.id, user.full_name))
        }
        UserCommands::Delete { id } => {
            let mut store = ctx.open_existing_store()?;
            let deleted = users::delete(&mut store, id)?;
            ctx.emit(&serde_json::json!({ "id": deleted }), || {
                format!("Deleted user {deleted}")
            })
        }
        UserCommands::List(args) => list(args, ctx),
        UserCommands::Show { id } => {
            let store = ctx.open_existing_store()?;
            let user = users::get(&store, id)?;
            ctx.emit(&user, || format_user_details(&user))
        }
    }
}

fn merge_update(mut request: UserAddUpdRequest, fields: &UserFieldsArgs) -> UserAddUpdRequest {
    if let Some(first) = &fields.first_name {
        request.first_name.clone_from(first);
    }
    if let Some(last) = &fields.last_name {
        request.last_name.clone_from(last);
    }
    if let Some(email) = &fields.email {
        request.email.clone_from(email);
    }
    if let Some(avatar) = &fields.avatar {
        request.avatar_url = Some(avatar.clone()).filter(|a| !a.trim().is_empty());
    }
    request
}

fn list(args: &UserListArgs, ctx: &CommandContext) -> Result<()> {
    let request = UserListGetRequest {
        search: args.search.clone(),
        order_by: args.by_email.then_some(UserOrderBy::Email),
        order_direction: args.reverse.then_some(OrderDirection::Desc),
        page_index: args.page,
        page_size: args.page_size,
    };
    let store = ctx.open_existing_store()?;
    let page = users::list(&store, &request, &PagingLimits::from(&ctx.settings))?;
    ctx.emit(&page, || {
        if page.entries.is_empty() {
            return "No users found.".to_string();
        }
        page.entries
            .iter()
            .map(format_user_line)
            .collect::<Vec<_>>()
            .join("\n")
    })
}
