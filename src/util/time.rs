//! Timestamp display helpers.

use chrono::{DateTime, Local, Utc};

/// Render a timestamp in local time, minute precision.
#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// Coarse age of `then` relative to `now`: `just now`, `5m ago`, `3h ago`,
/// `2d ago`, `6w ago`. Future timestamps read as `just now`.
#[must_use]
pub fn relative_age(then: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(*then);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = elapsed.num_days();
    if days < 14 {
        return format!("{days}d ago");
    }
    format!("{}w ago", days / 7)
}
