//! `yabt item`: backlog item commands.

use super::CommandContext;
use crate::cli::{
    ItemCommands, ItemContentArgs, ItemCreateArgs, ItemListArgs, ItemTagsArgs, ItemUpdateArgs,
    RelationArg, SortArg,
};
use crate::error::{Result, YabtError};
use crate::format::{
    TextFormatOptions, format_item_details, format_item_line_with, format_tag_counts,
    terminal_width,
};
use crate::model::{BacklogItemState, BacklogItemType, BacklogRelationshipType};
use crate::services::PagingLimits;
use crate::services::backlog_items::{
    BacklogItemAddUpdRequest, BacklogItemListGetRequest, BacklogItemTagListGetRequest, commands,
    load_item, queries,
};
use crate::storage::{OrderBy, OrderDirection, UserRelation};
use crate::util::id::normalize_id;
use serde_json::Value;
use tracing::debug;

/// Execute an item subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, an argument is invalid
/// or the service rejects the change.
pub fn execute(command: &ItemCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        ItemCommands::Create(args) => create(args, ctx),
        ItemCommands::List(args) => list(args, ctx),
        ItemCommands::Show { id } => show(id, ctx),
        ItemCommands::Update(args) => update(args, ctx),
        ItemCommands::Delete { id } => {
            let mut store = ctx.open_existing_store()?;
            let deleted = commands::delete(&mut store, id)?;
            ctx.emit(&serde_json::json!({ "id": deleted }), || format!("Deleted {deleted}"))
        }
        ItemCommands::State { id, state } => {
            let state: BacklogItemState = state.parse()?;
            let mut store = ctx.open_existing_store()?;
            let item = commands::set_state(&mut store, ctx.actor(), id, state)?;
            ctx.emit(&item, || format!("{} is now {}", item.id, item.state))
        }
        ItemCommands::Assign { id, user } => {
            let mut store = ctx.open_existing_store()?;
            let item = commands::assign(&mut store, ctx.actor(), id, user.as_deref())?;
            ctx.emit(&item, || {
                item.assignee.as_ref().map_or_else(
                    || format!("Unassigned {}", item.id),
                    |a| format!("Assigned {} to {}", item.id, a.full_name),
                )
            })
        }
        ItemCommands::Tags(args) => tags(args, ctx),
    }
}

fn create(args: &ItemCreateArgs, ctx: &CommandContext) -> Result<()> {
    let item_type: BacklogItemType = args.item_type.parse()?;
    let mut request = BacklogItemAddUpdRequest {
        title: args.title.clone(),
        tags: args.tags.clone(),
        ..BacklogItemAddUpdRequest::default()
    };
    apply_content(&mut request, &args.content)?;

    let mut store = ctx.open_store()?;
    let item = commands::create(&mut store, ctx.actor(), item_type, &request)?;
    ctx.emit(&item, || format!("Created {}: {}", item.id, item.title))
}

fn update(args: &ItemUpdateArgs, ctx: &CommandContext) -> Result<()> {
    let mut store = ctx.open_existing_store()?;
    let current = load_item(&store, &args.id)?;
    let mut request = BacklogItemAddUpdRequest::from(&current);

    if let Some(title) = &args.title {
        request.title.clone_from(title);
    }
    if args.unassign {
        request.assignee_id = None;
    }
    if args.clear_size {
        request.estimated_size = None;
    }
    for tag in &args.add_tag {
        request.tags.push(tag.clone());
    }
    request
        .tags
        .retain(|t| !args.remove_tag.iter().any(|r| r.trim().eq_ignore_ascii_case(t.trim())));
    request
        .related_items
        .retain(|id, _| !args.unrelate.iter().any(|u| normalize_id(u) == normalize_id(id)));
    request
        .custom_fields
        .retain(|id, _| !args.clear_field.iter().any(|c| normalize_id(c) == normalize_id(id)));
    apply_content(&mut request, &args.content)?;
    debug!(id = %args.id, ?request, "Built update request");

    let item = commands::update(&mut store, ctx.actor(), &args.id, &request)?;
    ctx.emit(&item, || format!("Updated {}: {}", item.id, item.title))
}

fn show(id: &str, ctx: &CommandContext) -> Result<()> {
    let store = ctx.open_existing_store()?;
    let item = queries::get(&store, id)?;
    ctx.emit(&item, || format_item_details(&item, ctx.use_color))
}

fn list(args: &ItemListArgs, ctx: &CommandContext) -> Result<()> {
    let request = BacklogItemListGetRequest {
        search: args.search.clone(),
        item_type: args
            .item_type
            .as_deref()
            .map(str::parse::<BacklogItemType>)
            .transpose()?,
        states: args.state.clone(),
        tags: args.tag.clone(),
        assigned_user_id: args.assignee.clone(),
        user_relation: args.mine.map(|m| match m {
            RelationArg::Assigned => UserRelation::Assigned,
            RelationArg::Created => UserRelation::Created,
            RelationArg::Modified => UserRelation::Modified,
        }),
        order_by: args.sort.map(|s| match s {
            SortArg::Number => OrderBy::Number,
            SortArg::Title => OrderBy::Title,
            SortArg::Assignee => OrderBy::Assignee,
            SortArg::Created => OrderBy::Created,
            SortArg::Updated => OrderBy::Updated,
        }),
        order_direction: args.reverse.then_some(OrderDirection::Desc),
        page_index: args.page,
        page_size: args.page_size,
    };

    let store = ctx.open_existing_store()?;
    let limits = PagingLimits::from(&ctx.settings);
    let page = queries::list(&store, &request, ctx.actor(), &limits)?;

    ctx.emit(&page, || {
        if page.entries.is_empty() {
            return "No backlog items found.".to_string();
        }
        let options = TextFormatOptions {
            use_color: ctx.use_color,
            max_width: Some(terminal_width()),
        };
        let mut lines: Vec<String> = page
            .entries
            .iter()
            .map(|item| format_item_line_with(item, options))
            .collect();
        lines.push(format!(
            "\nPage {} of {} ({} item(s))",
            page.page_index + 1,
            page.total_pages.max(1),
            page.total_records
        ));
        lines.join("\n")
    })
}

fn tags(args: &ItemTagsArgs, ctx: &CommandContext) -> Result<()> {
    let store = ctx.open_existing_store()?;
    let request = BacklogItemTagListGetRequest {
        search: args.search.clone(),
        max_tags: args.max,
    };
    let tags = queries::tags(&store, &request, ctx.settings.max_tags)?;
    ctx.emit(&tags, || format_tag_counts(&tags))
}

fn apply_content(request: &mut BacklogItemAddUpdRequest, args: &ItemContentArgs) -> Result<()> {
    if args.size.is_some() {
        request.estimated_size = args.size;
    }
    if let Some(assignee) = &args.assignee {
        request.assignee_id = Some(assignee.clone());
    }
    for raw in &args.related {
        let (id, link_type) = parse_related(raw)?;
        request
            .related_items
            .retain(|existing, _| normalize_id(existing) != normalize_id(&id));
        request.related_items.insert(id, link_type);
    }
    for raw in &args.fields {
        let (id, value) = parse_field_value(raw)?;
        request.custom_fields.insert(id, value);
    }
    if let Some(severity) = &args.severity {
        request.severity = Some(severity.parse()?);
    }
    if let Some(priority) = &args.priority {
        request.priority = Some(priority.parse()?);
    }
    if args.steps.is_some() {
        request.steps_to_reproduce.clone_from(&args.steps);
    }
    if args.acceptance.is_some() {
        request.acceptance_criteria.clone_from(&args.acceptance);
    }
    if args.description.is_some() {
        request.description.clone_from(&args.description);
    }
    Ok(())
}

/// `ID` or `ID:linkType`; the link type defaults to `related`.
fn parse_related(raw: &str) -> Result<(String, BacklogRelationshipType)> {
    match raw.split_once(':') {
        Some((id, link_type)) => Ok((id.trim().to_string(), link_type.parse()?)),
        None => Ok((raw.trim().to_string(), BacklogRelationshipType::Related)),
    }
}

/// `FIELD_ID=VALUE`; VALUE is read as JSON when it parses, else as text.
fn parse_field_value(raw: &str) -> Result<(String, Value)> {
    let (id, value) = raw
        .split_once('=')
        .filter(|(id, _)| !id.trim().is_empty())
        .ok_or_else(|| {
            YabtError::validation("customFields", format!("expected FIELD_ID=VALUE, got '{raw}'"))
        })?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((id.trim().to_string(), value))
}
