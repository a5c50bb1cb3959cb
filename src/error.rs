//! Error types
//!
//! The filter itself can only fail because its sink failed. Those errors are
//! carried verbatim and never retried here: whether a partial write at the
//! sink is safe to repeat is only known to the sink or the caller.

use std::io;

use thiserror::Error;

/// Failure forwarding redacted output to the sink
#[derive(Debug, Error)]
pub enum RedactError {
    /// The sink failed during a `write`. The whole chunk was still taken
    /// into the buffer; `accepted` of its bytes reached the sink.
    #[error("sink write failed after {accepted} byte(s) of the chunk were forwarded: {source}")]
    PartialWrite {
        accepted: usize,
        #[source]
        source: io::Error,
    },

    /// The sink failed while draining the stream
    #[error("sink write failed while flushing: {0}")]
    Sink(#[source] io::Error),
}

impl RedactError {
    /// Bytes of the failed chunk that reached the sink
    pub fn accepted(&self) -> usize {
        match self {
            RedactError::PartialWrite { accepted, .. } => *accepted,
            RedactError::Sink(_) => 0,
        }
    }

    /// The sink's original error
    pub fn io_error(&self) -> &io::Error {
        match self {
            RedactError::PartialWrite { source, .. } | RedactError::Sink(source) => source,
        }
    }

    /// Unwrap into the sink's original error
    pub fn into_io(self) -> io::Error {
        match self {
            RedactError::PartialWrite { source, .. } | RedactError::Sink(source) => source,
        }
    }
}

/// Flush failures collected from every member of a [`crate::Mux`]
#[derive(Debug, Error)]
#[error("{}", join_lines(.failures))]
pub struct MuxError {
    failures: Vec<RedactError>,
}

impl MuxError {
    pub(crate) fn from_failures(failures: Vec<RedactError>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[RedactError] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<RedactError> {
        self.failures
    }
}

fn join_lines(failures: &[RedactError]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
