//! Stream Buffer and Flush Engine
//!
//! Holds bytes that cannot be emitted yet because they might still turn out
//! to be part of a secret. Positions are absolute stream offsets: `start` is
//! the offset of the first retained byte and grows as the buffer is
//! compacted, so pending ranges never need rewriting.
//!
//! In steady state the buffer only holds the tail needed to resolve
//! in-flight partial matches.

use std::io::{self, Write};

use super::range::Range;

/// What a flush managed to emit before stopping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flushed {
    /// Buffer offset the cursor reached, relative to the buffer start at the
    /// time of the flush
    pub reached: usize,
    /// Pass-through bytes written to the sink
    pub passed_through: usize,
    /// Substitution markers written to the sink
    pub markers: usize,
    /// Marker bytes written to the sink
    pub marker_bytes: usize,
}

impl Flushed {
    /// Total bytes handed to the sink
    pub fn bytes_out(&self) -> usize {
        self.passed_through + self.marker_bytes
    }
}

/// A sink failure part way through a flush
#[derive(Debug)]
pub struct FlushFault {
    /// Progress made before the sink failed
    pub progress: Flushed,
    /// The sink's error, untouched
    pub source: io::Error,
}

/// Unflushed tail of the stream
pub struct StreamBuffer {
    bytes: Vec<u8>,
    /// Absolute stream offset of `bytes[0]`
    start: usize,
}

impl StreamBuffer {
    /// Create with preallocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            start: 0,
        }
    }

    /// Append a chunk, returning the absolute offset of its first byte
    pub fn append(&mut self, chunk: &[u8]) -> usize {
        let at = self.end();
        self.bytes.extend_from_slice(chunk);
        at
    }

    /// Number of retained bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Absolute offset of the first retained byte
    pub fn start(&self) -> usize {
        self.start
    }

    /// Absolute offset one past the last retained byte
    pub fn end(&self) -> usize {
        self.start + self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the buffer to `sink` up to relative offset `limit`, replacing
    /// every pending range that starts before `limit` with `marker`.
    ///
    /// A range is written whole once its start is inside the window, even
    /// if it ends past `limit`. Written bytes and consumed ranges are
    /// retired whether or not the sink fails, so nothing the sink accepted
    /// is ever written twice.
    pub fn flush_up_to<W: Write>(
        &mut self,
        limit: usize,
        pending: &mut Vec<Range>,
        marker: &[u8],
        sink: &mut W,
    ) -> Result<Flushed, FlushFault> {
        let mut progress = Flushed::default();
        if limit == 0 || self.bytes.is_empty() {
            return Ok(progress);
        }
        let limit = limit.min(self.bytes.len());

        let mut consumed = 0;
        let result = self.emit(limit, pending, marker, sink, &mut progress, &mut consumed);
        self.retire(progress.reached, pending, consumed);

        match result {
            Ok(()) => Ok(progress),
            Err(source) => Err(FlushFault { progress, source }),
        }
    }

    fn emit<W: Write>(
        &self,
        limit: usize,
        pending: &[Range],
        marker: &[u8],
        sink: &mut W,
        progress: &mut Flushed,
        consumed: &mut usize,
    ) -> io::Result<()> {
        for range in pending {
            let to = range.to.saturating_sub(self.start);

            if range.from < self.start {
                // The marker for this span went out in an earlier flush and
                // a longer overlapping secret has since completed. Skip the
                // rest of it silently.
                progress.reached = progress.reached.max(to);
                *consumed += 1;
                continue;
            }

            let from = range.from - self.start;
            if from >= limit {
                break;
            }

            if progress.reached < from {
                sink.write_all(&self.bytes[progress.reached..from])?;
                progress.passed_through += from - progress.reached;
                progress.reached = from;
            }

            sink.write_all(marker)?;
            progress.markers += 1;
            progress.marker_bytes += marker.len();
            // May land past `limit`; the whole span is already replaced.
            progress.reached = progress.reached.max(to);
            *consumed += 1;
        }

        if progress.reached < limit {
            sink.write_all(&self.bytes[progress.reached..limit])?;
            progress.passed_through += limit - progress.reached;
            progress.reached = limit;
        }

        Ok(())
    }

    /// Discard the first `cursor` bytes and the first `consumed` ranges
    fn retire(&mut self, cursor: usize, pending: &mut Vec<Range>, consumed: usize) {
        if cursor == 0 {
            return;
        }

        if cursor >= self.bytes.len() {
            // Drained: keep the allocation for the next chunk.
            self.start += self.bytes.len();
            self.bytes.clear();
            pending.clear();
            return;
        }

        self.bytes.drain(..cursor);
        self.start += cursor;
        pending.drain(..consumed);
    }
}
