//! Fan-out across several redactors
//!
//! A process often filters more than one stream (say, the job log and a
//! local transcript) with the same secret set. Each redactor keeps its own
//! buffer and match state; the mux only forwards `flush` and `reset`.

use std::io::Write;
use std::sync::Arc;

use crate::error::{MuxError, RedactError};
use crate::redactor::Redactor;

/// The operations a [`Mux`] forwards to its members
pub trait Redact: Send + Sync {
    /// End the member's stream
    fn flush(&self) -> Result<(), RedactError>;

    /// Replace the member's needle set
    fn reset(&self, needles: &[&[u8]]);
}

impl<W: Write + Send> Redact for Redactor<W> {
    fn flush(&self) -> Result<(), RedactError> {
        Redactor::flush(self)
    }

    fn reset(&self, needles: &[&[u8]]) {
        Redactor::reset(self, needles.iter().copied())
    }
}

/// An ordered collection of redactors
#[derive(Clone, Default)]
pub struct Mux {
    members: Vec<Arc<dyn Redact>>,
}

impl Mux {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a redactor; it is flushed and reset after the existing ones
    pub fn push(&mut self, member: Arc<dyn Redact>) {
        self.members.push(member);
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Flush every member, in order. All members are flushed even if some
    /// fail; the failures are returned together.
    pub fn flush(&self) -> Result<(), MuxError> {
        let failures: Vec<RedactError> = self
            .members
            .iter()
            .filter_map(|member| member.flush().err())
            .collect();

        match MuxError::from_failures(failures) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Reset every member with the same needles
    pub fn reset<I, N>(&self, needles: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        let owned: Vec<N> = needles.into_iter().collect();
        let needles: Vec<&[u8]> = owned.iter().map(AsRef::as_ref).collect();
        for member in &self.members {
            member.reset(&needles);
        }
    }
}

impl FromIterator<Arc<dyn Redact>> for Mux {
    fn from_iter<T: IntoIterator<Item = Arc<dyn Redact>>>(iter: T) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}
