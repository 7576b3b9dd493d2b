//! Fuzz target for the redaction engine.
//!
//! Text and byte redaction must agree on UTF-8 input, and structural
//! scrubbing must accept any JSON value and be idempotent.

#![no_main]

use arbitrary::Arbitrary;
use fdb_redact::{PatternRedactor, Redactor};
use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    text: &'a str,
    bytes: &'a [u8],
    json: &'a [u8],
}

fn redactor() -> &'static PatternRedactor {
    static REDACTOR: OnceLock<PatternRedactor> = OnceLock::new();
    REDACTOR.get_or_init(PatternRedactor::default)
}

fuzz_target!(|input: Input<'_>| {
    let redactor = redactor();

    let once = redactor.redact_str(input.text);
    assert_eq!(redactor.redact(input.text.as_bytes()), once.as_bytes());

    let _ = redactor.redact(input.bytes);

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(input.json) {
        let scrubbed = redactor.scrub(&value);
        assert_eq!(redactor.scrub(&scrubbed), scrubbed);
    }
});
