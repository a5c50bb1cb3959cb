//! Configuration module for the stream redactor
//!
//! Configuration arrives as JSON from whatever process embeds the filter.
//! Every field has a default, so `{}` is a valid configuration.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::selection;

/// Default replacement written in place of each redacted span
pub const DEFAULT_SUBSTITUTION: &str = "[REDACTED]";

/// Default preallocated stream buffer size
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// Redactor configuration
#[derive(Clone, Debug, Deserialize)]
pub struct RedactorConfig {
    /// Marker written in place of each redacted span
    #[serde(default = "default_substitution")]
    pub substitution: String,

    /// Glob patterns over environment variable names whose values are secret
    #[serde(default = "default_redacted_vars")]
    pub redacted_vars: Vec<String>,

    /// Values shorter than this are never treated as secrets
    #[serde(default = "default_min_secret_length")]
    pub min_secret_length: usize,

    /// Preallocated stream buffer size
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
}

fn default_substitution() -> String {
    DEFAULT_SUBSTITUTION.to_string()
}

fn default_redacted_vars() -> Vec<String> {
    vec![
        "*_PASSWORD".to_string(),
        "*_SECRET".to_string(),
        "*_TOKEN".to_string(),
        "*_PRIVATE_KEY".to_string(),
        "*_ACCESS_KEY".to_string(),
        "*_SECRET_KEY".to_string(),
        "*_CONNECTION_STRING".to_string(),
    ]
}

fn default_min_secret_length() -> usize {
    selection::REDACT_LENGTH_MIN
}

fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}

impl Default for RedactorConfig {
    fn default() -> Self {
        Self {
            substitution: default_substitution(),
            redacted_vars: default_redacted_vars(),
            min_secret_length: default_min_secret_length(),
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl RedactorConfig {
    /// Parse configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str = std::str::from_utf8(bytes)?;
        Self::from_json(config_str)
    }

    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Select the secret values in `environment` according to this
    /// configuration's patterns and minimum length
    pub fn needles_from_env<I, K, V>(&self, environment: I) -> Vec<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        selection::values_to_redact(&self.redacted_vars, environment, self.min_secret_length)
    }
}
