//! Telemetry Module for the stream redactor
//!
//! Emits structured audit events through the `log` facade so that whichever
//! logger the host installs can collect them. Events carry counts, variable
//! names and patterns only; secret values never appear here.

use log::{debug, info, warn};
use serde::Serialize;

/// Audit event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// Needle set replaced
    NeedlesReset,
    /// Stream drained by a terminal flush
    StreamDrained,
    /// Sink rejected redacted output
    SinkFault,
    /// Variable-name pattern could not be compiled
    PatternRejected,
    /// Candidate secret too short to redact
    SecretSkipped,
}

/// Running counters for one redactor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RedactionStats {
    /// Bytes accepted from the producer
    pub bytes_in: u64,
    /// Bytes handed to the sink, markers included
    pub bytes_out: u64,
    /// Substitution markers written
    pub spans_redacted: u64,
}

/// Audit event for logging
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Event type
    pub event_type: AuditEventType,
    /// Number of active needles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needle_count: Option<usize>,
    /// Redactor counters at the time of the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<RedactionStats>,
    /// Environment variable involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    /// Glob pattern involved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Reason for the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_type,
            needle_count: None,
            stats: None,
            variable: None,
            pattern: None,
            reason: None,
        }
    }

    pub fn with_needle_count(mut self, count: usize) -> Self {
        self.needle_count = Some(count);
        self
    }

    pub fn with_stats(mut self, stats: RedactionStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_variable(mut self, name: &str) -> Self {
        self.variable = Some(name.to_string());
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }

    /// Log the event
    pub fn emit(&self) {
        let json = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize audit event: {}", e);
                return;
            }
        };

        match self.event_type {
            AuditEventType::SinkFault
            | AuditEventType::PatternRejected
            | AuditEventType::SecretSkipped => warn!("[REDACTOR-AUDIT] {}", json),
            AuditEventType::NeedlesReset => info!("[REDACTOR-AUDIT] {}", json),
            AuditEventType::StreamDrained => debug!("[REDACTOR-AUDIT] {}", json),
        }
    }
}

/// Needle set replaced
pub fn audit_reset(needle_count: usize) -> AuditEvent {
    AuditEvent::new(AuditEventType::NeedlesReset).with_needle_count(needle_count)
}

/// Terminal flush completed
pub fn audit_drained(stats: RedactionStats) -> AuditEvent {
    AuditEvent::new(AuditEventType::StreamDrained).with_stats(stats)
}

/// Sink failed
pub fn audit_sink_fault(error: &std::io::Error, stats: RedactionStats) -> AuditEvent {
    AuditEvent::new(AuditEventType::SinkFault)
        .with_reason(&error.to_string())
        .with_stats(stats)
}

/// Bad variable-name pattern
pub fn audit_bad_pattern(pattern: &str, reason: &str) -> AuditEvent {
    AuditEvent::new(AuditEventType::PatternRejected)
        .with_pattern(pattern)
        .with_reason(reason)
}

/// Value of `name` too short to be redacted
pub fn audit_short_secret(name: &str, min_len: usize) -> AuditEvent {
    AuditEvent::new(AuditEventType::SecretSkipped)
        .with_variable(name)
        .with_reason(&format!(
            "value below minimum length ({} bytes) and will not be redacted",
            min_len
        ))
}
