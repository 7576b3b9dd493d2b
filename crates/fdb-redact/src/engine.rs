//! Main redaction engine.
//!
//! `PatternRedactor` applies the policy to the three content shapes a bundle
//! carries: raw bytes (logs), text (resources, summary) and structured values
//! (graph, diagnosis, metadata).

use crate::{RedactionError, RedactionPolicy, Result, SecretDetector};
use regex::bytes::{Captures as BytesCaptures, Regex as BytesRegex};
use regex::{Captures, Regex};
use serde::Serialize;
use serde_json::{Map, Value};

/// Content redaction contract used by the bundler.
pub trait Redactor {
    /// Pattern-redact raw bytes. Bytes outside matches are kept as-is.
    fn redact(&self, input: &[u8]) -> Vec<u8>;

    /// Pattern-redact text.
    fn redact_str(&self, input: &str) -> String;

    /// Structurally scrub a mapping/sequence/scalar value.
    fn scrub(&self, value: &Value) -> Value;

    /// Normalize any serializable value into `Value` form, then scrub it.
    fn scrub_serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Value>
    where
        Self: Sized,
    {
        let normalized = serde_json::to_value(value).map_err(RedactionError::Normalize)?;
        Ok(self.scrub(&normalized))
    }
}

/// Characters a marked value may contain: anything but quotes and ASCII
/// whitespace.
const TEXT_VALUE: &str = r#"[^"'\t\n\x0C\r ]"#;

/// Byte form of `TEXT_VALUE`. Bytes that are not valid UTF-8 are part of the
/// value, so a stray byte can neither hide a secret nor cut one short.
const BYTES_VALUE: &str = r#"(?:[^"'\t\n\x0C\r ]|(?-u:[\x80-\xFF]))"#;

/// Build the field-marker pattern: `<marker> [:=] ["']value["']`.
fn marker_pattern(markers: &[String], value: &str) -> Result<String> {
    let alternatives: Vec<String> = markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Err(RedactionError::PatternError(
            "no pattern markers configured".to_string(),
        ));
    }
    Ok(format!(
        r#"(?i)({})[\t\n\x0C\r ]*[:=][\t\n\x0C\r ]*["']?({}+)["']?"#,
        alternatives.join("|"),
        value
    ))
}

/// Redactor driven by a `RedactionPolicy`.
#[derive(Debug, Clone)]
pub struct PatternRedactor {
    policy: RedactionPolicy,
    text_pattern: Regex,
    bytes_pattern: BytesRegex,
    detector: Option<SecretDetector>,
}

impl PatternRedactor {
    /// Create a redactor for the given policy.
    pub fn new(policy: RedactionPolicy) -> Result<Self> {
        policy.validate()?;
        let text_source = marker_pattern(&policy.pattern_markers, TEXT_VALUE)?;
        let bytes_source = marker_pattern(&policy.pattern_markers, BYTES_VALUE)?;
        let text_pattern =
            Regex::new(&text_source).map_err(|e| RedactionError::PatternError(e.to_string()))?;
        let bytes_pattern = BytesRegex::new(&bytes_source)
            .map_err(|e| RedactionError::PatternError(e.to_string()))?;
        let detector = policy.detect_known_secrets.then(SecretDetector::new);

        Ok(Self {
            policy,
            text_pattern,
            bytes_pattern,
            detector,
        })
    }

    /// Get a reference to the policy.
    pub fn policy(&self) -> &RedactionPolicy {
        &self.policy
    }

    /// Get the mask literal.
    pub fn mask(&self) -> &str {
        &self.policy.mask
    }

    fn scrub_map(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in map {
            if self.policy.is_sensitive_key(key) {
                // Replaced wholesale; nested content is never visited.
                out.insert(key.clone(), Value::String(self.policy.mask.clone()));
            } else {
                out.insert(key.clone(), self.scrub(value));
            }
        }
        out
    }

    fn scrub_leaf(&self, value: &Value) -> Value {
        match (value, &self.detector) {
            (Value::String(s), Some(detector)) => {
                Value::String(detector.mask_str(s, &self.policy.mask).into_owned())
            }
            _ => value.clone(),
        }
    }
}

impl Default for PatternRedactor {
    fn default() -> Self {
        // The default policy is a compile-time constant set of markers.
        Self::new(RedactionPolicy::default()).expect("default redaction policy is valid")
    }
}

impl Redactor for PatternRedactor {
    fn redact(&self, input: &[u8]) -> Vec<u8> {
        let mask = self.policy.mask.as_bytes();
        let replaced = self
            .bytes_pattern
            .replace_all(input, |caps: &BytesCaptures<'_>| {
                let mut out = Vec::with_capacity(caps[1].len() + 2 + mask.len());
                out.extend_from_slice(&caps[1]);
                out.extend_from_slice(b": ");
                out.extend_from_slice(mask);
                out
            });
        match &self.detector {
            Some(detector) => detector.mask_bytes(&replaced, &self.policy.mask).into_owned(),
            None => replaced.into_owned(),
        }
    }

    fn redact_str(&self, input: &str) -> String {
        let mask = &self.policy.mask;
        let replaced = self
            .text_pattern
            .replace_all(input, |caps: &Captures<'_>| format!("{}: {}", &caps[1], mask));
        match &self.detector {
            Some(detector) => detector.mask_str(&replaced, mask).into_owned(),
            None => replaced.into_owned(),
        }
    }

    fn scrub(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(self.scrub_map(map)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.scrub(v)).collect()),
            leaf => self.scrub_leaf(leaf),
        }
    }
}
