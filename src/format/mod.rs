//! Output formatting for `yabt`.
//!
//! Human-readable text for terminals; `--json` prints the service response
//! types as they are, in the same camelCase shape the HTTP API answers with.

mod text;

pub use text::{
    TextFormatOptions, format_comments, format_field_line, format_item_details, format_item_line,
    format_item_line_with, format_state_icon, format_state_icon_colored, format_state_label,
    format_tag_counts, format_type_badge, format_type_badge_colored, format_user_details,
    format_user_line, terminal_width, truncate_title,
};
