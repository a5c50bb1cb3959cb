//! Streaming Secret Redactor
//!
//! Sits between a producer and a sink and replaces every occurrence of a
//! known secret with a fixed marker before it reaches the sink, including
//! secrets split across separate writes.
//!
//! Each `write`:
//! 1. appends the chunk to the stream buffer,
//! 2. advances the match tracker over the new bytes,
//! 3. merges overlapping completed ranges,
//! 4. writes out as much of the buffer as it can without spilling bytes of
//!    a secret that might still be completing.
//!
//! `flush` ends the stream: unresolved partial matches cannot complete any
//! more, so they are treated as non-matches and everything is written.

use std::io::{self, Write};

use log::debug;
use parking_lot::Mutex;

use crate::config::{RedactorConfig, DEFAULT_BUFFER_CAPACITY};
use crate::error::RedactError;
use crate::streaming::{FlushFault, MatchTracker, NeedleIndex, StreamBuffer};
use crate::telemetry::{self, RedactionStats};

/// Everything a write touches, guarded together
struct State<W> {
    sink: W,
    index: NeedleIndex,
    tracker: MatchTracker,
    buffer: StreamBuffer,
    stats: RedactionStats,
}

impl<W: Write> State<W> {
    /// Flush the buffer up to `limit` and account for what reached the sink
    fn drain_to(&mut self, limit: usize, marker: &[u8]) -> Result<(), FlushFault> {
        let result = self.buffer.flush_up_to(
            limit,
            self.tracker.completed_mut(),
            marker,
            &mut self.sink,
        );

        let progress = match &result {
            Ok(progress) => *progress,
            Err(fault) => fault.progress,
        };
        self.stats.bytes_out += progress.bytes_out() as u64;
        self.stats.spans_redacted += progress.markers as u64;

        if let Err(fault) = &result {
            telemetry::audit_sink_fault(&fault.source, self.stats).emit();
        }
        result.map(|_| ())
    }
}

/// Streaming secret redactor in front of a sink `W`.
///
/// All operations take `&self` and are serialised by one internal lock, so
/// a redactor can be shared between threads (e.g. in an `Arc`) when `W` is
/// `Send`. Concurrent writers are not ordered beyond "one call completes
/// before the next begins".
///
/// ```
/// use stream_redactor::Redactor;
///
/// let redactor = Redactor::new(Vec::new(), "[REDACTED]", ["sekret"]);
/// redactor.write(b"the sek").unwrap();
/// redactor.write(b"ret is safe").unwrap();
/// redactor.flush().unwrap();
/// assert_eq!(redactor.into_inner(), b"the [REDACTED] is safe");
/// ```
pub struct Redactor<W> {
    marker: Box<[u8]>,
    state: Mutex<State<W>>,
}

impl<W: Write> Redactor<W> {
    /// Create a redactor writing to `sink`, replacing each occurrence of any
    /// needle with `substitution`. Empty needles are ignored.
    pub fn new<S, I, N>(sink: W, substitution: S, needles: I) -> Self
    where
        S: AsRef<[u8]>,
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        Self::with_buffer_capacity(sink, substitution, needles, DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a redactor using the marker and buffer size from `config`
    pub fn from_config<I, N>(sink: W, config: &RedactorConfig, needles: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        Self::with_buffer_capacity(sink, &config.substitution, needles, config.buffer_capacity)
    }

    fn with_buffer_capacity<S, I, N>(sink: W, substitution: S, needles: I, capacity: usize) -> Self
    where
        S: AsRef<[u8]>,
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        let index = NeedleIndex::new(needles);
        debug!("Redactor created with {} needles", index.len());

        Self {
            marker: Box::from(substitution.as_ref()),
            state: Mutex::new(State {
                sink,
                tracker: MatchTracker::with_capacity(index.len()),
                index,
                buffer: StreamBuffer::with_capacity(capacity),
                stats: RedactionStats::default(),
            }),
        }
    }

    /// Redact `chunk` and forward whatever can safely be emitted.
    ///
    /// Returns `chunk.len()` on success. The chunk is always taken into the
    /// buffer, even when the sink fails; the error then reports how many of
    /// the chunk's bytes reached the sink.
    pub fn write(&self, chunk: &[u8]) -> Result<usize, RedactError> {
        if chunk.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock();
        let state = &mut *state;

        let buffered_before = state.buffer.len();
        let start = state.buffer.append(chunk);
        state.tracker.scan(&state.index, chunk, start);
        state.tracker.merge_completed();
        state.stats.bytes_in += chunk.len() as u64;

        let limit = state.tracker.flush_limit(state.buffer.len());
        match state.drain_to(limit, &self.marker) {
            Ok(()) => Ok(chunk.len()),
            Err(fault) => Err(RedactError::PartialWrite {
                accepted: fault
                    .progress
                    .reached
                    .saturating_sub(buffered_before)
                    .min(chunk.len()),
                source: fault.source,
            }),
        }
    }

    /// End of stream: write everything still buffered and flush the sink.
    ///
    /// Partial matches are discarded as non-matches. Calling this again
    /// writes nothing more; the redactor can keep being used afterwards.
    pub fn flush(&self) -> Result<(), RedactError> {
        let mut state = self.state.lock();

        state.tracker.abandon_partials();
        let limit = state.buffer.len();
        state
            .drain_to(limit, &self.marker)
            .map_err(|fault| RedactError::Sink(fault.source))?;
        state.sink.flush().map_err(RedactError::Sink)?;

        telemetry::audit_drained(state.stats).emit();
        Ok(())
    }

    /// Replace the secrets to redact.
    ///
    /// No flush is needed beforehand. Secrets that have begun matching keep
    /// matching until they complete or fail, and new secrets are only looked
    /// for in data written after this call.
    pub fn reset<I, N>(&self, needles: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        let mut state = self.state.lock();
        state.index.rebuild(needles);
        telemetry::audit_reset(state.index.len()).emit();
    }

    /// Counters since creation
    pub fn stats(&self) -> RedactionStats {
        self.state.lock().stats
    }

    /// Bytes held back waiting for partial matches to resolve
    pub fn buffered(&self) -> usize {
        self.state.lock().buffer.len()
    }

    /// Longest confirmed prefix among partial matches still in flight.
    /// Outside of a sink fault, [`Redactor::buffered`] never exceeds it.
    pub fn longest_partial(&self) -> usize {
        self.state.lock().tracker.longest_partial()
    }

    /// Number of active needles
    pub fn needle_count(&self) -> usize {
        self.state.lock().index.len()
    }

    /// Length of the longest active needle
    pub fn longest_needle(&self) -> usize {
        self.state.lock().index.longest()
    }

    /// The substitution marker
    pub fn substitution(&self) -> &[u8] {
        &self.marker
    }

    /// Recover the sink. Anything still buffered is dropped, so call
    /// [`Redactor::flush`] first.
    pub fn into_inner(self) -> W {
        self.state.into_inner().sink
    }
}

/// Writing through a shared reference, like `&File`.
///
/// `io::Write::flush` only flushes the sink: buffered writers above this one
/// call it at arbitrary points, and ending the stream there would leak
/// secrets split across the following write. Use [`Redactor::flush`] to end
/// the stream.
impl<W: Write> Write for &Redactor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The chunk is consumed even on failure, so a partial count would
        // make `write_all` resend bytes already buffered. Report the error.
        Redactor::write(*self, buf).map_err(RedactError::into_io)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.lock().sink.flush()
    }
}

impl<W: Write> Write for Redactor<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Write::write(&mut &*self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.state.get_mut().sink.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const MARKER: &str = "[REDACTED]";

    fn redact_chunks(needles: &[&str], chunks: &[&str]) -> String {
        let redactor = Redactor::new(Vec::new(), MARKER, needles.iter().copied());
        for chunk in chunks {
            assert_eq!(redactor.write(chunk.as_bytes()).unwrap(), chunk.len());
        }
        redactor.flush().unwrap();
        String::from_utf8(redactor.into_inner()).unwrap()
    }

    /// Accepts `ok` write calls, rejects the next `failures`, then accepts
    /// everything again
    struct FlakySink {
        out: Vec<u8>,
        ok: usize,
        failures: usize,
        flushes: usize,
    }

    impl FlakySink {
        fn new(ok: usize, failures: usize) -> Self {
            Self {
                out: Vec::new(),
                ok,
                failures,
                flushes: 0,
            }
        }
    }

    impl Write for FlakySink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.ok > 0 {
                self.ok -= 1;
            } else if self.failures > 0 {
                self.failures -= 1;
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "sink busy"));
            }
            self.out.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_single_write() {
        assert_eq!(
            redact_chunks(&["sekret"], &["the sekret is safe"]),
            "the [REDACTED] is safe"
        );
    }

    #[test]
    fn test_secret_split_across_writes() {
        assert_eq!(
            redact_chunks(&["sekret"], &["the sek", "ret is safe"]),
            "the [REDACTED] is safe"
        );
    }

    #[test]
    fn test_byte_at_a_time() {
        let input = "the sekret is safe";
        let chunks: Vec<String> = input.chars().map(String::from).collect();
        let chunks: Vec<&str> = chunks.iter().map(String::as_str).collect();
        assert_eq!(redact_chunks(&["sekret"], &chunks), "the [REDACTED] is safe");
    }

    #[test]
    fn test_overlapping_needles_single_marker() {
        assert_eq!(
            redact_chunks(&["abcdef", "cdefgh"], &["xxabcdefghxx"]),
            "xx[REDACTED]xx"
        );
        assert_eq!(
            redact_chunks(&["abcdef", "cdefgh"], &["xxabc", "defg", "hxx"]),
            "xx[REDACTED]xx"
        );
    }

    #[test]
    fn test_adjacent_secrets_two_markers() {
        assert_eq!(
            redact_chunks(&["abc", "def"], &["abcdef"]),
            "[REDACTED][REDACTED]"
        );
    }

    #[test]
    fn test_incomplete_secret_released_on_flush() {
        assert_eq!(redact_chunks(&["sekret"], &["partial sek"]), "partial sek");
    }

    #[test]
    fn test_partial_secret_held_back() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        redactor.write(b"partial sek").unwrap();
        assert_eq!(redactor.buffered(), 3);

        redactor.write(b"tor").unwrap();
        assert_eq!(redactor.buffered(), 0);
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner(), b"partial sektor");
    }

    #[test]
    fn test_short_secret_inside_long_one() {
        // The short needle completes first while the long one is still open.
        assert_eq!(
            redact_chunks(&["sekret-value", "ret"], &["a sekret-", "value b"]),
            "a [REDACTED] b"
        );
        // The long one fails: only the short one is redacted.
        assert_eq!(
            redact_chunks(&["sekret-value", "ret"], &["a sekret-", "vague b"]),
            "a sek[REDACTED]-vague b"
        );
    }

    #[test]
    fn test_secret_completing_after_earlier_marker_was_flushed() {
        // "abcd" is emitted as soon as it completes; "bcdefg" then turns out
        // to extend it. The output still has a single marker.
        assert_eq!(
            redact_chunks(&["abcd", "bcdefg"], &["-abcd", "efg-"]),
            "-[REDACTED]-"
        );
        assert_eq!(
            redact_chunks(&["abcd", "bcdefg"], &["-abcd", "efx-"]),
            "-[REDACTED]efx-"
        );
    }

    #[test]
    fn test_single_byte_needle() {
        assert_eq!(redact_chunks(&["x"], &["axbx", "x"]), "a[REDACTED]b[REDACTED][REDACTED]");
    }

    #[test]
    fn test_no_needles_passthrough() {
        let none: [&str; 0] = [];
        assert_eq!(redact_chunks(&none, &["hello ", "world"]), "hello world");
    }

    #[test]
    fn test_empty_write_is_noop() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        assert_eq!(redactor.write(b"").unwrap(), 0);
        assert_eq!(redactor.stats(), RedactionStats::default());
    }

    #[test]
    fn test_flush_is_idempotent() {
        let redactor = Redactor::new(FlakySink::new(0, 0), MARKER, ["sekret"]);
        redactor.write(b"tail sek").unwrap();
        redactor.flush().unwrap();
        redactor.flush().unwrap();

        let sink = redactor.into_inner();
        assert_eq!(sink.out, b"tail sek");
        assert_eq!(sink.flushes, 2);
    }

    #[test]
    fn test_reset_keeps_in_flight_match() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        redactor.write(b"the sek").unwrap();
        redactor.reset(["other"]);
        redactor.write(b"ret, another sekret").unwrap();
        redactor.flush().unwrap();

        assert_eq!(
            String::from_utf8(redactor.into_inner()).unwrap(),
            "the [REDACTED], an[REDACTED] sekret"
        );
    }

    #[test]
    fn test_retention_follows_in_flight_match_after_reset() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["abcdefghij"]);
        redactor.write(b"xxabcdefgh").unwrap();
        assert_eq!(redactor.buffered(), 8);
        assert_eq!(redactor.longest_partial(), 8);

        // Shorter needles do not shrink what the running match holds back.
        redactor.reset(["zz"]);
        assert_eq!(redactor.longest_needle(), 2);
        assert_eq!(redactor.buffered(), 8);
        assert_eq!(redactor.longest_partial(), 8);

        redactor.write(b"ij!").unwrap();
        assert_eq!(redactor.buffered(), 0);
        assert_eq!(redactor.longest_partial(), 0);
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner(), b"xx[REDACTED]!");
    }

    #[test]
    fn test_reset_does_not_rescan_buffer() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["abcdef"]);
        redactor.write(b"abcde").unwrap();
        // "bcd" is already buffered but was written before the reset.
        redactor.reset(["bcd", "abcdef"]);
        redactor.write(b"X").unwrap();
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner(), b"abcdeX");
    }

    #[test]
    fn test_reset_skips_empty_needles() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        redactor.reset(["", "hunter2", ""]);
        assert_eq!(redactor.needle_count(), 1);
        assert_eq!(redactor.longest_needle(), 7);
    }

    #[test]
    fn test_sink_fault_reports_accepted_bytes() {
        // "ab " reaches the sink, the marker does not.
        let redactor = Redactor::new(FlakySink::new(1, 1), MARKER, ["sekret"]);

        let err = redactor.write(b"ab sekret cd").unwrap_err();
        assert_eq!(err.accepted(), 3);
        assert_eq!(redactor.buffered(), 9);

        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner().out, b"ab [REDACTED] cd");
    }

    #[test]
    fn test_sink_fault_then_recovery_no_duplicates() {
        let redactor = Redactor::new(FlakySink::new(0, 1), MARKER, ["sekret"]);

        let err = redactor.write(b"hello").unwrap_err();
        assert_eq!(err.accepted(), 0);
        assert_eq!(err.io_error().kind(), io::ErrorKind::WouldBlock);
        assert_eq!(redactor.buffered(), 5);

        redactor.write(b" sekret").unwrap();
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner().out, b"hello [REDACTED]");
    }

    #[test]
    fn test_sink_fault_on_bytes_buffered_earlier() {
        let redactor = Redactor::new(FlakySink::new(1, 1), MARKER, ["sekret"]);
        redactor.write(b"a sek").unwrap();

        // The failing marker covers bytes from the previous chunk, so none
        // of this chunk reached the sink.
        let err = redactor.write(b"ret b").unwrap_err();
        assert_eq!(err.accepted(), 0);

        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner().out, b"a [REDACTED] b");
    }

    #[test]
    fn test_flush_reports_sink_error() {
        let redactor = Redactor::new(FlakySink::new(1, 1), MARKER, ["sekret"]);
        redactor.write(b"x sek").unwrap();

        let err = redactor.flush().unwrap_err();
        assert!(matches!(err, RedactError::Sink(_)));
        // The held-back bytes are still there for a retry.
        assert_eq!(redactor.buffered(), 3);

        redactor.flush().unwrap();
        let sink = redactor.into_inner();
        assert_eq!(sink.out, b"x sek");
        assert_eq!(sink.flushes, 1);
    }

    #[test]
    fn test_stats() {
        let redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        redactor.write(b"the sekret is safe").unwrap();
        redactor.flush().unwrap();

        let stats = redactor.stats();
        assert_eq!(stats.bytes_in, 18);
        assert_eq!(stats.bytes_out, 22);
        assert_eq!(stats.spans_redacted, 1);
    }

    #[test]
    fn test_from_config() {
        let config = RedactorConfig {
            substitution: "***".to_string(),
            buffer_capacity: 16,
            ..Default::default()
        };
        let redactor = Redactor::from_config(Vec::new(), &config, ["hunter2"]);
        assert_eq!(redactor.substitution(), b"***");
        redactor.write(b"pw=hunter2;").unwrap();
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner(), b"pw=***;");
    }

    #[test]
    fn test_io_write_adapter() {
        let mut redactor = Redactor::new(Vec::new(), MARKER, ["sekret"]);
        write!(redactor, "token={}", "sekret").unwrap();
        io::Write::flush(&mut redactor).unwrap();
        // io::Write::flush does not end the stream.
        Redactor::flush(&redactor).unwrap();
        assert_eq!(redactor.into_inner(), b"token=[REDACTED]");
    }

    #[test]
    fn test_io_write_through_line_writer() {
        // LineWriter flushes its inner writer on every newline.
        let redactor = Redactor::new(Vec::new(), MARKER, ["sek\nret"]);
        {
            let mut lines = io::LineWriter::new(&redactor);
            lines.write_all(b"a sek\n").unwrap();
            lines.write_all(b"ret b\n").unwrap();
        }
        redactor.flush().unwrap();
        assert_eq!(redactor.into_inner(), b"a [REDACTED] b\n");
    }

    #[test]
    fn test_io_write_returns_sink_error_verbatim() {
        let redactor = Redactor::new(FlakySink::new(0, 1), MARKER, ["sekret"]);
        let err = io::Write::write(&mut &redactor, b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(err.to_string(), "sink busy");
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let redactor = Arc::new(Redactor::new(Vec::new(), MARKER, ["sekret"]));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let redactor = Arc::clone(&redactor);
            handles.push(tokio::task::spawn_blocking(move || {
                for _ in 0..100 {
                    redactor.write(b"line with sekret\n").unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        redactor.flush().unwrap();
        let redactor = Arc::try_unwrap(redactor).ok().unwrap();
        let out = String::from_utf8(redactor.into_inner()).unwrap();
        assert_eq!(out.matches("line with [REDACTED]\n").count(), 400);
        assert!(!out.contains("sekret"));
    }
}
