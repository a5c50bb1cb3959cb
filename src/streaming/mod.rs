//! Streaming module for secret redaction
//!
//! This module provides the primitives the redactor is built from:
//! - Needle index bucketed by first byte
//! - Byte-at-a-time multi-needle matching across chunk boundaries
//! - Range merging so overlapping secrets share one marker
//! - A stream buffer that only retains the unresolved tail

pub mod match_tracker;
pub mod needle_index;
pub mod range;
pub mod stream_buffer;

pub use match_tracker::{MatchTracker, PartialMatch};
pub use needle_index::{Needle, NeedleIndex};
pub use range::{merge_overlaps, Range};
pub use stream_buffer::{FlushFault, Flushed, StreamBuffer};
