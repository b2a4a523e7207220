//! Property tests for document id helpers.

use proptest::prelude::*;
use yabt::util::id::{
    format_short_id, full_id, id_for_dynamic_field, normalize_id, parse_sequence, short_id,
};

fn collection() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("Users"), Just("BacklogItems"), Just("CustomFields")]
}

proptest! {
    #[test]
    fn sequence_survives_formatting(n in 1_i64..1_000_000, prefix in collection()) {
        let short = format_short_id(n);
        prop_assert_eq!(parse_sequence(&short), Some(n));
        prop_assert_eq!(parse_sequence(&full_id(prefix, &short)), Some(n));
    }

    #[test]
    fn full_and_short_ids_normalize_alike(n in 1_i64..1_000_000, prefix in collection()) {
        let short = format_short_id(n);
        let full = full_id(prefix, &short);
        prop_assert_eq!(short_id(&full), short.as_str());
        prop_assert_eq!(full_id(prefix, &full), full.clone());
        prop_assert_eq!(normalize_id(&full), normalize_id(&short.to_uppercase()));
        prop_assert_eq!(normalize_id(&full.to_lowercase()), normalize_id(&short));
    }

    #[test]
    fn dynamic_field_keeps_only_safe_chars(raw in "[ -~]{0,40}") {
        let cleaned = id_for_dynamic_field(&raw);
        prop_assert!(cleaned
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '@' || c == '-'));
        prop_assert!(!cleaned.contains('/'));
        prop_assert_eq!(id_for_dynamic_field(&cleaned), cleaned.clone());
    }
}
