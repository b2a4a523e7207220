//! `yabt field`: custom field definitions.

use super::CommandContext;
use crate::cli::FieldCommands;
use crate::error::Result;
use crate::format::format_field_line;
use crate::model::{BacklogItemType, CustomFieldType};
use crate::services::custom_fields::{
    self, CustomFieldAddRequest, CustomFieldListGetRequest, CustomFieldUpdRequest,
};

fn parse_types(raw: &[String]) -> Result<Vec<BacklogItemType>> {
    raw.iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| t.parse())
        .collect()
}

/// Execute a field subcommand.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, a type name is invalid
/// or the service rejects the change.
pub fn execute(command: &FieldCommands, ctx: &CommandContext) -> Result<()> {
    match command {
        FieldCommands::Add {
            name,
            field_type,
            mandatory,
            item_types,
        } => {
            let request = CustomFieldAddRequest {
                name: name.clone(),
                field_type: field_type.parse::<CustomFieldType>()?,
                is_mandatory: *mandatory,
                backlog_item_types: parse_types(item_types)?,
            };
            let mut store = ctx.open_store()?;
            let field = custom_fields::create(&mut store, &request)?;
            ctx.emit(&field, || format!("Created field {}: {}", field.id, field.name))
        }
        FieldCommands::Update {
            id,
            name,
            mandatory,
            item_types,
        } => {
            let mut store = ctx.open_existing_store()?;
            let current = custom_fields::get(&store, id)?;
            let request = CustomFieldUpdRequest {
                name: name.clone().unwrap_or(current.name),
                is_mandatory: mandatory.unwrap_or(current.is_mandatory),
                backlog_item_types: match item_types {
                    Some(types) => parse_types(types)?,
                    None => current.backlog_item_types,
                },
            };
            let field = custom_fields::update(&mut store, id, &request)?;
            ctx.emit(&field, || format!("Updated field {}: {}", field.id, field.name))
        }
        FieldCommands::Delete { id } => {
            let mut store = ctx.open_existing_store()?;
            let deleted = custom_fields::delete(&mut store, id)?;
            ctx.emit(&serde_json::json!({ "id": deleted }), || {
                format!("Deleted field {deleted}")
            })
        }
        FieldCommands::List {
            item_type,
            mandatory,
        } => {
            let request = CustomFieldListGetRequest {
                item_type: item_type
                    .as_deref()
                    .map(str::parse::<BacklogItemType>)
                    .transpose()?,
                is_mandatory: *mandatory,
            };
            let store = ctx.open_existing_store()?;
            let fields = custom_fields::list(&store, &request)?;
            ctx.emit(&fields, || {
                if fields.is_empty() {
                    return "No custom fields defined.".to_string();
                }
                fields
                    .iter()
                    .map(format_field_line)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_skip_blanks_and_reject_unknown() {
        let types = parse_types(&["bug".into(), " ".into(), "userStory".into()]).unwrap();
        assert_eq!(types, vec![BacklogItemType::Bug, BacklogItemType::UserStory]);
        assert!(parse_types(&["spike".into()]).is_err());
    }
}
