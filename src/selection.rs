//! Secret Selection
//!
//! Decides which environment values are secrets: a value qualifies when its
//! variable name matches one of the configured glob patterns and it is long
//! enough to be worth redacting. Redacting very short values such as `none`
//! or `true` would mangle ordinary log output for no benefit.
//!
//! Patterns follow shell path matching, so `*` never crosses `/`. Problems
//! with patterns or values are reported as warnings; the stream is filtered
//! with whatever needles remain.

use std::collections::BTreeMap;

use globset::{GlobBuilder, GlobMatcher};

use crate::telemetry;

/// Shortest value considered a potential secret. If `*_TOKEN` is redacted
/// and `API_TOKEN=none`, this keeps the word "none" out of the needle set.
pub const REDACT_LENGTH_MIN: usize = 6;

/// Compile patterns, warning about and skipping the invalid ones
fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Vec<GlobMatcher> {
    patterns
        .iter()
        .filter_map(|pattern| {
            let pattern = pattern.as_ref();
            match GlobBuilder::new(pattern)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
            {
                Ok(glob) => Some(glob.compile_matcher()),
                Err(e) => {
                    telemetry::audit_bad_pattern(pattern, &e.kind().to_string()).emit();
                    None
                }
            }
        })
        .collect()
}

/// Names and values of the variables to redact.
///
/// A variable is selected if its name matches at least one pattern and its
/// value is at least `min_len` bytes. Non-empty values below the minimum
/// are skipped with a warning.
pub fn vars_to_redact<S, I, K, V>(
    patterns: &[S],
    environment: I,
    min_len: usize,
) -> BTreeMap<String, String>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let matchers = compile_patterns(patterns);
    let mut vars = BTreeMap::new();
    if matchers.is_empty() {
        return vars;
    }

    for (name, value) in environment {
        let name = name.into();
        if !matchers.iter().any(|m| m.is_match(&name)) {
            continue;
        }

        let value = value.into();
        if value.len() < min_len {
            if !value.is_empty() {
                telemetry::audit_short_secret(&name, min_len).emit();
            }
            continue;
        }

        vars.insert(name, value);
    }

    vars
}

/// Values of the variables to redact, ordered by variable name
pub fn values_to_redact<S, I, K, V>(patterns: &[S], environment: I, min_len: usize) -> Vec<String>
where
    S: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    vars_to_redact(patterns, environment, min_len)
        .into_values()
        .collect()
}
