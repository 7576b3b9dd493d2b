//! Redaction policy configuration.
//!
//! The policy names the mask literal, the field markers matched in free text,
//! the key fragments that mark a structured value as sensitive, and whether
//! well-known secret formats are detected anywhere in text.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Schema version for the policy file.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Mask literal substituted for every redacted value.
pub const DEFAULT_MASK: &str = "[REDACTED]";

/// Field markers recognized by pattern redaction (`<marker>: value`).
pub const DEFAULT_PATTERN_MARKERS: &[&str] = &["password", "token", "key", "secret"];

/// Key fragments that make a mapping entry sensitive during structural redaction.
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &["password", "token", "key", "secret", "authorization"];

/// Redaction policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionPolicy {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Replacement literal for redacted values.
    #[serde(default = "default_mask")]
    pub mask: String,

    /// Markers matched case-insensitively in text, followed by `:` or `=`.
    #[serde(default = "default_pattern_markers")]
    pub pattern_markers: Vec<String>,

    /// Substrings of lower-cased mapping keys that trigger wholesale replacement.
    #[serde(default = "default_sensitive_keys")]
    pub sensitive_keys: Vec<String>,

    /// Whether well-known token formats (AWS, GitHub, JWT, PEM...) are masked
    /// wherever they appear.
    #[serde(default)]
    pub detect_known_secrets: bool,
}

fn default_schema_version() -> String {
    POLICY_SCHEMA_VERSION.to_string()
}

fn default_mask() -> String {
    DEFAULT_MASK.to_string()
}

fn default_pattern_markers() -> Vec<String> {
    DEFAULT_PATTERN_MARKERS.iter().map(|s| s.to_string()).collect()
}

fn default_sensitive_keys() -> Vec<String> {
    DEFAULT_SENSITIVE_KEYS.iter().map(|s| s.to_string()).collect()
}

impl RedactionPolicy {
    /// Create a new policy with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load policy from a JSON file. Missing fields take their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: RedactionPolicy = serde_json::from_str(&content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Save policy to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Enable or disable well-known secret detection.
    pub fn with_known_secret_detection(mut self, enabled: bool) -> Self {
        self.detect_known_secrets = enabled;
        self
    }

    /// Returns true if the lower-cased key contains a sensitive fragment.
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.sensitive_keys
            .iter()
            .any(|fragment| lower.contains(fragment.to_lowercase().as_str()))
    }

    /// Check the policy for values that would make redaction unsafe.
    pub fn validate(&self) -> crate::Result<()> {
        if self.schema_version != POLICY_SCHEMA_VERSION {
            return Err(crate::RedactionError::PolicyError(format!(
                "unsupported policy schema version {} (supported: {})",
                self.schema_version, POLICY_SCHEMA_VERSION
            )));
        }
        if self.mask.is_empty() {
            return Err(crate::RedactionError::PolicyError(
                "mask must not be empty".to_string(),
            ));
        }
        if self.pattern_markers.iter().all(|m| m.trim().is_empty()) {
            return Err(crate::RedactionError::PolicyError(
                "at least one pattern marker is required".to_string(),
            ));
        }
        if self.sensitive_keys.iter().any(|k| k.is_empty()) {
            // An empty fragment matches every key.
            return Err(crate::RedactionError::PolicyError(
                "sensitive key fragments must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RedactionPolicy {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            mask: default_mask(),
            pattern_markers: default_pattern_markers(),
            sensitive_keys: default_sensitive_keys(),
            detect_known_secrets: false,
        }
    }
}
