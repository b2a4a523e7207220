//! Document ID helpers.
//!
//! Documents are keyed by full ids of the form `<Collection>/<n>-<node>`
//! (e.g. `Users/1-A`). The API and embedded references use the short form
//! (`1-A`). Comparisons are case-insensitive.

use regex::Regex;
use std::sync::LazyLock;

/// Node tag appended to sequence numbers.
pub const NODE_TAG: &str = "A";

static DYNAMIC_FIELD_INVALID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\.@-]").unwrap_or_else(|e| panic!("invalid static regex: {e}"))
});

/// Build a full id from a collection prefix and a short id.
///
/// Ids that already carry a prefix are returned unchanged.
#[must_use]
pub fn full_id(prefix: &str, id: &str) -> String {
    let id = id.trim();
    if id.contains('/') {
        id.to_string()
    } else {
        format!("{prefix}/{id}")
    }
}

/// Strip the collection prefix from an id.
#[must_use]
pub fn short_id(id: &str) -> &str {
    id.rsplit('/').next().unwrap_or(id)
}

/// Canonical form used for comparisons and index terms.
#[must_use]
pub fn normalize_id(id: &str) -> String {
    short_id(id.trim()).to_lowercase()
}

/// Remove characters that cannot appear in an index field name.
///
/// Keeps word characters, `.`, `@` and `-`.
#[must_use]
pub fn id_for_dynamic_field(id: &str) -> String {
    DYNAMIC_FIELD_INVALID
        .replace_all(short_id(id), "")
        .into_owned()
}

/// Format a sequence number as a short id.
#[must_use]
pub fn format_short_id(sequence: i64) -> String {
    format!("{sequence}-{NODE_TAG}")
}

/// Extract the sequence number from a short or full id.
#[must_use]
pub fn parse_sequence(id: &str) -> Option<i64> {
    short_id(id).split('-').next()?.parse().ok()
}
