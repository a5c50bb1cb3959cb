//! Multi-Needle Match Tracking
//!
//! A direct byte-at-a-time scan rather than Aho-Corasick: every needle that
//! could be in progress is followed independently, which makes it easy to
//! audit that no occurrence is ever missed, including overlapping ones.
//! Cost is O(active partial matches) per byte.

use super::needle_index::{Needle, NeedleIndex};
use super::range::{merge_overlaps, Range};

/// How far through one needle the stream has matched
#[derive(Clone, Debug)]
pub struct PartialMatch {
    needle: Needle,
    matched: usize,
}

impl PartialMatch {
    /// Number of leading needle bytes confirmed so far
    pub fn matched(&self) -> usize {
        self.matched
    }

    /// The needle being matched
    pub fn needle(&self) -> &[u8] {
        &self.needle
    }
}

/// Per-stream matcher state
#[derive(Default)]
pub struct MatchTracker {
    /// Partial matches alive after the last scanned byte
    partial: Vec<PartialMatch>,
    /// Scratch list for the next byte; swapped with `partial`
    next: Vec<PartialMatch>,
    /// Completed ranges not yet flushed, ordered by `to`
    completed: Vec<Range>,
}

impl MatchTracker {
    /// Create a tracker sized for `needles` concurrent matches
    pub fn with_capacity(needles: usize) -> Self {
        Self {
            partial: Vec::with_capacity(needles),
            next: Vec::with_capacity(needles),
            completed: Vec::with_capacity(needles),
        }
    }

    /// Advance the matcher over `bytes`, whose first byte sits at absolute
    /// stream position `start`.
    pub fn scan(&mut self, index: &NeedleIndex, bytes: &[u8], start: usize) {
        for (offset, &byte) in bytes.iter().enumerate() {
            let pos = start + offset;

            // Continue in-progress matches.
            for mut m in self.partial.drain(..) {
                if m.needle[m.matched] != byte {
                    continue;
                }
                m.matched += 1;
                if m.matched < m.needle.len() {
                    self.next.push(m);
                    continue;
                }
                self.completed
                    .push(Range::new(pos + 1 - m.needle.len(), pos + 1));
            }

            // Start new matches.
            for needle in index.starting_with(byte) {
                if needle.len() == 1 {
                    self.completed.push(Range::new(pos, pos + 1));
                    continue;
                }
                self.next.push(PartialMatch {
                    needle: Needle::clone(needle),
                    matched: 1,
                });
            }

            // `partial` is empty after the drain; reuse it as next scratch.
            std::mem::swap(&mut self.partial, &mut self.next);
        }
    }

    /// Collapse overlapping completed ranges
    pub fn merge_completed(&mut self) {
        merge_overlaps(&mut self.completed);
    }

    /// Furthest buffer offset that can be emitted while `buffered` bytes are
    /// held: every byte of a surviving partial match must stay behind.
    pub fn flush_limit(&self, buffered: usize) -> usize {
        self.partial
            .iter()
            .map(|m| buffered.saturating_sub(m.matched))
            .fold(buffered, usize::min)
    }

    /// Drop every partial match. Used at end of stream, where nothing can
    /// complete them any more.
    pub fn abandon_partials(&mut self) {
        self.partial.clear();
    }

    /// Longest confirmed prefix among surviving partial matches
    pub fn longest_partial(&self) -> usize {
        self.partial.iter().map(|m| m.matched).max().unwrap_or(0)
    }

    pub fn partials(&self) -> &[PartialMatch] {
        &self.partial
    }

    pub fn completed(&self) -> &[Range] {
        &self.completed
    }

    pub fn completed_mut(&mut self) -> &mut Vec<Range> {
        &mut self.completed
    }
}
