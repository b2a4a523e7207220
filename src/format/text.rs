//! Text formatting functions for `yabt`.
//!
//! Provides terminal output for the CLI:
//! - State icons (◇ ○ ◎ ◐ ✓ ✗)
//! - Type badges ([bug], [userStory], etc.)
//! - Item, user and custom field lines
//! - The multi-line item detail view

use crate::model::{BacklogItemDetails, BacklogItemState, BacklogItemType, Comment};
use crate::services::backlog_items::{BacklogItemGetResponse, BacklogItemListGetResponse};
use crate::services::custom_fields::CustomFieldListGetResponse;
use crate::services::users::{UserGetByIdResponse, UserListGetResponse};
use crate::storage::TagCount;
use crate::util::time::{format_timestamp, relative_age};
use chrono::Utc;
use std::fmt::Write as _;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// State icon characters.
pub mod icons {
    pub const PROPOSED: &str = "◇";
    pub const NEW: &str = "○";
    pub const READY: &str = "◎";
    pub const IN_PROGRESS: &str = "◐";
    pub const DONE: &str = "✓";
    pub const CLOSED: &str = "✗";
}

const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const MAGENTA: &str = "\x1b[35m";
const CYAN: &str = "\x1b[36m";
const DIM: &str = "\x1b[90m";

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
    pub max_width: Option<usize>,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_color: false,
            max_width: None,
        }
    }
}

#[must_use]
pub const fn format_state_icon(state: BacklogItemState) -> &'static str {
    match state {
        BacklogItemState::Proposed => icons::PROPOSED,
        BacklogItemState::New => icons::NEW,
        BacklogItemState::Ready => icons::READY,
        BacklogItemState::InProgress => icons::IN_PROGRESS,
        BacklogItemState::Done => icons::DONE,
        BacklogItemState::Closed => icons::CLOSED,
    }
}

const fn state_color(state: BacklogItemState) -> &'static str {
    match state {
        BacklogItemState::Proposed => BLUE,
        BacklogItemState::New => GREEN,
        BacklogItemState::Ready => CYAN,
        BacklogItemState::InProgress => YELLOW,
        BacklogItemState::Done | BacklogItemState::Closed => DIM,
    }
}

#[must_use]
pub fn format_state_label(state: BacklogItemState, use_color: bool) -> String {
    paint(state.as_str(), state_color(state), use_color)
}

#[must_use]
pub fn format_state_icon_colored(state: BacklogItemState, use_color: bool) -> String {
    paint(format_state_icon(state), state_color(state), use_color)
}

/// Format item type as a bracketed badge.
#[must_use]
pub fn format_type_badge(item_type: BacklogItemType) -> String {
    format!("[{}]", item_type.as_str())
}

#[must_use]
pub fn format_type_badge_colored(item_type: BacklogItemType, use_color: bool) -> String {
    let color = match item_type {
        BacklogItemType::Bug => RED,
        BacklogItemType::Feature => CYAN,
        BacklogItemType::UserStory => MAGENTA,
        BacklogItemType::Task => "",
    };
    if color.is_empty() {
        return format_type_badge(item_type);
    }
    format!("[{}]", paint(item_type.as_str(), color, use_color))
}

/// Determine terminal width from environment (falls back to 80).
#[must_use]
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|columns| columns.trim().parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(80)
}

/// Truncate a title to fit within `max_len` visible columns.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(title) <= max_len {
        return title.to_string();
    }

    let (target_len, ellipsis) = if max_len <= 3 {
        (max_len, "")
    } else {
        (max_len - 3, "...")
    };

    let mut w = 0;
    let mut s = String::new();
    for c in title.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > target_len {
            break;
        }
        w += cw;
        s.push(c);
    }
    s.push_str(ellipsis);
    s
}

fn visible_len(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Format a single-line item summary with options.
///
/// Format: `{icon} {id} [{type}] {title} @{assignee} #{tag}...`
#[must_use]
pub fn format_item_line_with(item: &BacklogItemListGetResponse, options: TextFormatOptions) -> String {
    let icon_plain = format_state_icon(item.state);
    let badge_plain = format_type_badge(item.item_type);

    let mut suffix = String::new();
    if let Some(assignee) = &item.assignee {
        let _ = write!(suffix, " @{}", assignee.name);
    }
    for tag in &item.tags {
        let _ = write!(suffix, " #{tag}");
    }

    let prefix_len = visible_len(icon_plain)
        + 1
        + visible_len(&item.id)
        + 1
        + visible_len(&badge_plain)
        + 1
        + visible_len(&suffix);

    let title = options.max_width.map_or_else(
        || item.title.clone(),
        |width| truncate_title(&item.title, width.saturating_sub(prefix_len)),
    );

    let icon = format_state_icon_colored(item.state, options.use_color);
    let badge = format_type_badge_colored(item.item_type, options.use_color);
    let suffix = paint(&suffix, DIM, options.use_color && !suffix.is_empty());

    format!("{icon} {} {badge} {title}{suffix}", item.id)
}

#[must_use]
pub fn format_item_line(item: &BacklogItemListGetResponse) -> String {
    format_item_line_with(item, TextFormatOptions::plain())
}

fn push_section(out: &mut String, label: &str, body: &str) {
    let _ = writeln!(out, "\n{label}:");
    for line in body.lines() {
        let _ = writeln!(out, "  {line}");
    }
}

fn format_comment(out: &mut String, comment: &Comment) {
    let now = Utc::now();
    let _ = writeln!(
        out,
        "  [{}] {} ({})",
        comment.id,
        comment.author.name,
        relative_age(&comment.created, &now)
    );
    for line in comment.message.lines() {
        let _ = writeln!(out, "    {line}");
    }
}

/// The multi-line detail view of `yabt item show`.
#[must_use]
pub fn format_item_details(item: &BacklogItemGetResponse, use_color: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {} {}",
        format_state_icon_colored(item.state, use_color),
        item.id,
        format_type_badge_colored(item.details.item_type(), use_color),
        item.title
    );
    let _ = writeln!(out, "State: {}", format_state_label(item.state, use_color));
    if let Some(assignee) = &item.assignee {
        let _ = writeln!(out, "Assignee: {}", assignee.full_name);
    }
    if let Some(size) = item.estimated_size {
        let _ = writeln!(out, "Estimated size: {size}");
    }
    if !item.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", item.tags.join(", "));
    }
    if let Some(created) = &item.created {
        let _ = writeln!(
            out,
            "Created: {} by {}",
            format_timestamp(&created.timestamp),
            created.actioned_by.name
        );
    }
    if let Some(updated) = &item.last_updated {
        let _ = writeln!(
            out,
            "Updated: {} by {}",
            format_timestamp(&updated.timestamp),
            updated.actioned_by.name
        );
    }

    match &item.details {
        BacklogItemDetails::Bug(bug) => {
            if let Some(severity) = bug.severity {
                let _ = writeln!(out, "Severity: {severity:?}");
            }
            if let Some(priority) = bug.priority {
                let _ = writeln!(out, "Priority: {priority:?}");
            }
            if let Some(steps) = &bug.steps_to_reproduce {
                push_section(&mut out, "Steps to reproduce", steps);
            }
            if let Some(criteria) = &bug.acceptance_criteria {
                push_section(&mut out, "Acceptance criteria", criteria);
            }
        }
        BacklogItemDetails::UserStory(story) => {
            if let Some(criteria) = &story.acceptance_criteria {
                push_section(&mut out, "Acceptance criteria", criteria);
            }
        }
        BacklogItemDetails::Task(d) | BacklogItemDetails::Feature(d) => {
            if let Some(description) = &d.description {
                push_section(&mut out, "Description", description);
            }
        }
    }

    if !item.custom_fields.is_empty() {
        let _ = writeln!(out, "\nCustom fields:");
        for field in &item.custom_fields {
            let _ = writeln!(out, "  {}: {}", field.name, field.value);
        }
    }

    if !item.related_items.is_empty() {
        let _ = writeln!(out, "\nRelated:");
        for relation in &item.related_items {
            let _ = writeln!(
                out,
                "  {} {} {}",
                relation.link_type.as_str(),
                relation.related_to.id,
                relation.related_to.name
            );
        }
    }

    if !item.comments.is_empty() {
        let _ = writeln!(out, "\nComments ({}):", item.comments.len());
        for comment in &item.comments {
            format_comment(&mut out, comment);
        }
    }

    out.trim_end().to_string()
}

#[must_use]
pub fn format_comments(comments: &[Comment]) -> String {
    let mut out = String::new();
    for comment in comments {
        format_comment(&mut out, comment);
    }
    out.trim_end().to_string()
}

#[must_use]
pub fn format_user_line(user: &UserListGetResponse) -> String {
    format!("{:<6} {} <{}>", user.id, user.full_name, user.email)
}

#[must_use]
pub fn format_user_details(user: &UserGetByIdResponse) -> String {
    let mut out = format!("{} {}\nEmail: {}", user.id, user.full_name, user.email);
    if let Some(avatar) = &user.avatar_url {
        let _ = write!(out, "\nAvatar: {avatar}");
    }
    out
}

#[must_use]
pub fn format_field_line(field: &CustomFieldListGetResponse) -> String {
    let applies = if field.backlog_item_types.is_empty() {
        "all types".to_string()
    } else {
        field
            .backlog_item_types
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mandatory = if field.is_mandatory { " (mandatory)" } else { "" };
    format!(
        "{:<6} {} [{}]{mandatory} for {applies}",
        field.id,
        field.name,
        field.field_type.as_str()
    )
}

/// Tag counts as an aligned two-column list.
#[must_use]
pub fn format_tag_counts(tags: &[TagCount]) -> String {
    let width = tags.iter().map(|t| visible_len(&t.name)).max().unwrap_or(0);
    tags.iter()
        .map(|t| {
            let pad = width - visible_len(&t.name);
            format!("{}{} {}", t.name, " ".repeat(pad), t.count)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserReference;

    fn make_item() -> BacklogItemListGetResponse {
        BacklogItemListGetResponse {
            id: "7-A".into(),
            title: "Login button does nothing".into(),
            item_type: BacklogItemType::Bug,
            state: BacklogItemState::InProgress,
            assignee: Some(UserReference {
                id: Some("1-A".into()),
                name: "Simpson, H.".into(),
                full_name: "Homer Simpson".into(),
            }),
            tags: vec!["ui".into()],
            comments_count: 0,
            created: None,
            last_updated: None,
        }
    }

    #[test]
    fn state_icons() {
        assert_eq!(format_state_icon(BacklogItemState::New), icons::NEW);
        assert_eq!(format_state_icon(BacklogItemState::Done), icons::DONE);
    }

    #[test]
    fn item_line_plain() {
        assert_eq!(
            format_item_line(&make_item()),
            "◐ 7-A [bug] Login button does nothing @Simpson, H. #ui"
        );
    }

    #[test]
    fn item_line_truncates_title_only() {
        let line = format_item_line_with(
            &make_item(),
            TextFormatOptions {
                use_color: false,
                max_width: Some(40),
            },
        );
        assert!(line.contains("..."));
        assert!(line.ends_with("@Simpson, H. #ui"));
        assert!(visible_len(&line) <= 40);
    }

    #[test]
    fn truncate_title_handles_wide_chars() {
        assert_eq!(truncate_title("日本語のタイトル", 7), "日本...");
        assert_eq!(truncate_title("short", 10), "short");
        assert_eq!(truncate_title("abcdef", 2), "ab");
    }

    #[test]
    fn colored_badge_wraps_label() {
        let badge = format_type_badge_colored(BacklogItemType::Bug, true);
        assert!(badge.starts_with("[\x1b[31m"));
        assert_eq!(format_type_badge_colored(BacklogItemType::Task, true), "[task]");
    }

    #[test]
    fn tag_counts_align() {
        let text = format_tag_counts(&[
            TagCount {
                name: "backend".into(),
                count: 3,
            },
            TagCount {
                name: "ui".into(),
                count: 1,
            },
        ]);
        assert_eq!(text, "backend 3\nui      1");
    }
}
