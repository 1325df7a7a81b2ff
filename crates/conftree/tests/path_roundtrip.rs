/*
 * path_roundtrip.rs
 *
 * Property-based tests for dotted path formatting and parsing.
 *
 * Joining any non-empty list of segments and splitting the result must give
 * the same segments back, whatever characters the segments contain.
 */

use conftree::{CommentedConfig, UnmodifiableConfig, Value, join, split};
use proptest::prelude::*;

/// Segments biased towards the characters that need quoting or escaping
fn gen_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{1,8}",
        "[a-z.\"'\\\\ ]{0,6}",
        any::<String>(),
    ]
}

fn gen_segments() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(gen_segment(), 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn test_join_then_split_roundtrip(segments in gen_segments()) {
        let joined = join(&segments, '.');
        let parsed = split(&joined, '.').unwrap();
        prop_assert_eq!(parsed, segments);
    }

    #[test]
    fn test_roundtrip_with_other_separator(segments in gen_segments()) {
        let joined = join(&segments, '/');
        let parsed = split(&joined, '/').unwrap();
        prop_assert_eq!(parsed, segments);
    }

    #[test]
    fn test_joined_path_addresses_same_entry(segments in gen_segments()) {
        let mut config = CommentedConfig::new();
        config.set(segments.clone(), 1).unwrap();

        let joined = join(&segments, '.');
        prop_assert_eq!(config.set(joined.as_str(), 2).unwrap(), Some(Value::Integer(1)));
        prop_assert_eq!(config.get(&segments), Some(&Value::Integer(2)));
    }
}

#[test]
fn test_simple_segments_are_not_quoted() {
    assert_eq!(join(&["server", "port"], '.'), "server.port");
    assert_eq!(join(&["a.b", "", "it's"], '.'), r#""a.b"."".it's"#);
}
