//! Property tests for redaction completeness.
//!
//! A sensitive value planted at any depth of arbitrary structured data must
//! never survive scrubbing, and a marked value in free text must never
//! survive pattern redaction.

use fdb_redact::{PatternRedactor, Redactor};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Non-sensitive keys use letters that cannot spell any sensitive fragment.
const SAFE_KEY: &str = "[a-d]{1,6}";

fn secret_strategy() -> impl Strategy<Value = String> {
    "[0-9]{6,12}".prop_map(|digits| format!("ZZSECRET{digits}"))
}

fn sensitive_key_strategy() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["password", "token", "key", "secret", "authorization"]),
        "[a-d]{0,3}",
        "[a-d]{0,3}",
        any::<bool>(),
    )
        .prop_map(|(fragment, prefix, suffix, upper)| {
            let key = format!("{prefix}{fragment}{suffix}");
            if upper {
                key.to_uppercase()
            } else {
                key
            }
        })
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-d ]{0,10}".prop_map(Value::String),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

fn filler_strategy() -> impl Strategy<Value = Value> {
    leaf_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(SAFE_KEY, inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Wrap `{sensitive_key: secret}` in a random chain of arrays and safe-keyed maps.
fn planted_strategy() -> impl Strategy<Value = (Value, String)> {
    (
        sensitive_key_strategy(),
        secret_strategy(),
        0u8..3,
        prop::collection::vec((any::<bool>(), SAFE_KEY), 0..5),
        filler_strategy(),
    )
        .prop_map(|(key, secret, shape, wrappers, filler)| {
            let secret_value = match shape {
                0 => Value::String(secret.clone()),
                1 => serde_json::json!({ "nested": secret.clone() }),
                _ => serde_json::json!([secret.clone(), 1]),
            };

            let mut inner = Value::Object(Map::from_iter([(key, secret_value)]));
            for (is_array, wrapper_key) in wrappers {
                inner = if is_array {
                    Value::Array(vec![inner])
                } else {
                    Value::Object(Map::from_iter([(wrapper_key, inner)]))
                };
            }

            let doc = serde_json::json!({ "root": inner, "filler": filler });
            (doc, secret)
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    #[test]
    fn planted_secret_never_survives_scrub((doc, secret) in planted_strategy()) {
        let redactor = PatternRedactor::default();
        let scrubbed = redactor.scrub(&doc);
        let rendered = serde_json::to_string(&scrubbed).unwrap();

        prop_assert!(!rendered.contains(&secret), "secret leaked: {rendered}");
        prop_assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn scrub_is_identity_without_sensitive_keys(doc in filler_strategy()) {
        let redactor = PatternRedactor::default();
        prop_assert_eq!(redactor.scrub(&doc), doc);
    }

    #[test]
    fn marked_text_value_never_survives(
        marker in prop::sample::select(vec!["password", "Token", "KEY", "secret"]),
        delimiter in prop::sample::select(vec![":", "="]),
        spacing in " {0,2}",
        quote in prop::sample::select(vec!["", "\"", "'"]),
        value in "ZZ[A-Za-z0-9]{4,16}",
        prefix in "[a-d ]{0,10}",
        suffix in "[a-d ]{0,10}",
    ) {
        let redactor = PatternRedactor::default();
        let line = format!("{prefix} {marker}{spacing}{delimiter}{spacing}{quote}{value}{quote} {suffix}");

        let text = redactor.redact_str(&line);
        prop_assert!(!text.contains(&value), "value leaked: {text}");
        let expected = format!("{marker}: [REDACTED]");
        prop_assert!(text.contains(&expected), "missing {} in {}", expected, text);

        let bytes = redactor.redact(line.as_bytes());
        prop_assert_eq!(bytes, text.clone().into_bytes());
    }

    #[test]
    fn marked_byte_value_never_survives(
        marker in prop::sample::select(vec!["password", "token", "key", "secret"]),
        head in prop::collection::vec(0x80u8..=0xFF, 0..3),
        tail in prop::collection::vec(prop_oneof![0x80u8..=0xFF, b'A'..=b'Z'], 0..12),
    ) {
        let redactor = PatternRedactor::default();
        let mut line = format!("{marker}=").into_bytes();
        line.extend_from_slice(&head);
        line.extend_from_slice(b"ZZSECRET");
        line.extend_from_slice(&tail);
        line.extend_from_slice(b" done\n");

        let out = redactor.redact(&line);
        let mut expected = format!("{marker}: [REDACTED]").into_bytes();
        expected.extend_from_slice(b" done\n");
        prop_assert_eq!(out, expected);
    }

    #[test]
    fn pattern_redaction_is_idempotent(line in "[a-z =:]{0,40}") {
        let redactor = PatternRedactor::default();
        let once = redactor.redact_str(&line);
        let twice = redactor.redact_str(&once);
        prop_assert_eq!(once, twice);
    }
}
