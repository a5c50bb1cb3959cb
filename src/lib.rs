//! Streaming Secret Redaction
//!
//! This crate removes known secret values from a byte stream on its way from
//! a producer (e.g. a subprocess's combined output) to a sink (e.g. a log
//! writer). Secrets that straddle two writes are caught too: bytes that might
//! still be the start of a secret are held back until they are resolved.
//!
//! - [`Redactor`]: the streaming filter
//! - [`Mux`]: flush/reset fan-out over several redactors
//! - [`selection`]: picks secret values out of an environment
//! - [`RedactorConfig`]: JSON configuration
//!
//! ```
//! use stream_redactor::{Redactor, RedactorConfig};
//!
//! let config = RedactorConfig::default();
//! let needles = config.needles_from_env([("API_TOKEN", "tok_0123456789")]);
//!
//! let redactor = Redactor::from_config(Vec::new(), &config, &needles);
//! redactor.write(b"calling with tok_01234").unwrap();
//! redactor.write(b"56789\n").unwrap();
//! redactor.flush().unwrap();
//!
//! assert_eq!(redactor.into_inner(), b"calling with [REDACTED]\n");
//! ```

pub mod config;
pub mod error;
pub mod mux;
pub mod redactor;
pub mod selection;
pub mod streaming;
pub mod telemetry;

pub use config::RedactorConfig;
pub use error::{ConfigError, MuxError, RedactError};
pub use mux::{Mux, Redact};
pub use redactor::Redactor;
pub use selection::{values_to_redact, vars_to_redact, REDACT_LENGTH_MIN};
pub use telemetry::RedactionStats;
