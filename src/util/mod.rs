//! Shared utilities for `yabt`.
//!
//! - Document id helpers (full/short ids, sanitization)
//! - Content hashing for etags
//! - Time formatting

mod hash;
pub mod id;
pub mod time;

pub use hash::content_hash;
pub use id::{full_id, id_for_dynamic_field, normalize_id, short_id};
