//! Well-known secret detection.
//!
//! Matches token formats that are dangerous regardless of the field they
//! appear in (cloud keys, VCS tokens, JWTs, PEM private key headers). Used by
//! the redactor when `detect_known_secrets` is enabled in the policy.

use once_cell::sync::Lazy;
use regex::bytes::Regex as BytesRegex;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Type of detected secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretType {
    /// AWS access key (AKIA...)
    AwsAccessKey,
    /// GitHub personal access token
    GitHubToken,
    /// GitLab personal access token
    GitLabToken,
    /// Slack token (xoxb-...)
    SlackToken,
    /// JSON Web Token
    Jwt,
    /// Private key (PEM format)
    PrivateKey,
    /// OpenAI/Anthropic API key
    AiApiKey,
}

/// Detection pattern definition.
struct DetectionPattern {
    secret_type: SecretType,
    source: &'static str,
}

const PATTERNS: &[DetectionPattern] = &[
    DetectionPattern {
        secret_type: SecretType::AwsAccessKey,
        source: r"AKIA[0-9A-Z]{16}",
    },
    DetectionPattern {
        secret_type: SecretType::GitHubToken,
        source: r"gh[pousr]_[A-Za-z0-9_]{36,}",
    },
    DetectionPattern {
        secret_type: SecretType::GitLabToken,
        source: r"glpat-[A-Za-z0-9\-_]{20,}",
    },
    DetectionPattern {
        secret_type: SecretType::SlackToken,
        source: r"xox[baprs]-[A-Za-z0-9\-]+",
    },
    DetectionPattern {
        secret_type: SecretType::Jwt,
        source: r"eyJ[A-Za-z0-9_-]+\.eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+",
    },
    DetectionPattern {
        secret_type: SecretType::PrivateKey,
        source: r"-----BEGIN[A-Z ]*PRIVATE KEY-----",
    },
    DetectionPattern {
        // OpenAI: sk-..., Anthropic: sk-ant-...
        secret_type: SecretType::AiApiKey,
        source: r"sk-(?:ant-)?[A-Za-z0-9_-]{20,}",
    },
];

// Sources are literals covered by tests; compilation cannot fail at runtime.
static TEXT_PATTERNS: Lazy<Vec<(SecretType, Regex)>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .map(|p| (p.secret_type, Regex::new(p.source).unwrap()))
        .collect()
});

static BYTE_PATTERNS: Lazy<Vec<BytesRegex>> = Lazy::new(|| {
    PATTERNS
        .iter()
        .map(|p| BytesRegex::new(p.source).unwrap())
        .collect()
});

/// Detector for well-known secret formats.
#[derive(Debug, Clone, Default)]
pub struct SecretDetector;

impl SecretDetector {
    /// Create a new detector.
    pub fn new() -> Self {
        Self
    }

    /// Return the first secret type found in the value, if any.
    pub fn detect(&self, value: &str) -> Option<SecretType> {
        TEXT_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(value))
            .map(|(secret_type, _)| *secret_type)
    }

    /// Replace every well-known secret in the text with the mask.
    pub fn mask_str<'a>(&self, value: &'a str, mask: &str) -> Cow<'a, str> {
        let mut out = Cow::Borrowed(value);
        for (_, re) in TEXT_PATTERNS.iter() {
            if re.is_match(&out) {
                out = Cow::Owned(re.replace_all(&out, regex::NoExpand(mask)).into_owned());
            }
        }
        out
    }

    /// Replace every well-known secret in raw bytes with the mask.
    pub fn mask_bytes<'a>(&self, value: &'a [u8], mask: &str) -> Cow<'a, [u8]> {
        let mut out = Cow::Borrowed(value);
        for re in BYTE_PATTERNS.iter() {
            if re.is_match(&out) {
                out = Cow::Owned(
                    re.replace_all(&out, regex::bytes::NoExpand(mask.as_bytes()))
                        .into_owned(),
                );
            }
        }
        out
    }
}
