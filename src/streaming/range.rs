//! Byte Ranges and Overlap Merging
//!
//! Completed matches are tracked as half-open `[from, to)` ranges in
//! absolute stream coordinates. Ranges from different needles may overlap;
//! they are merged so that each contiguous redacted span gets exactly one
//! substitution marker.

/// A half-open byte interval `[from, to)`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Range {
    /// First byte covered (inclusive)
    pub from: usize,
    /// First byte after the range (exclusive)
    pub to: usize,
}

impl Range {
    /// Create a new range
    pub fn new(from: usize, to: usize) -> Self {
        debug_assert!(from <= to, "range start after end");
        Self { from, to }
    }

    /// Number of bytes covered
    pub fn len(&self) -> usize {
        self.to - self.from
    }

    /// True if the range covers no bytes
    pub fn is_empty(&self) -> bool {
        self.from == self.to
    }

    /// Check if `pos` lies inside the range
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        self.from <= pos && pos < self.to
    }

    /// Check if the two ranges share at least one position.
    ///
    /// Adjacent ranges (`a.to == b.from`) do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &Range) -> bool {
        self.contains(other.from) || other.contains(self.from)
    }

    /// Smallest range covering both
    #[inline]
    pub fn union(&self, other: &Range) -> Range {
        Range {
            from: self.from.min(other.from),
            to: self.to.max(other.to),
        }
    }
}

/// Collapse overlapping ranges in place.
///
/// `ranges` must be ordered by non-decreasing `to`, which is the order the
/// match tracker discovers them in. The result is ordered and disjoint and
/// reuses the input storage.
pub fn merge_overlaps(ranges: &mut Vec<Range>) {
    if ranges.len() <= 1 {
        return;
    }

    // Walk backwards, folding each range into ranges[j] or sliding it left.
    let mut j = ranges.len() - 1;
    for i in (0..j).rev() {
        if ranges[j].overlaps(&ranges[i]) {
            ranges[j] = ranges[j].union(&ranges[i]);
        } else {
            j -= 1;
            ranges[j] = ranges[i];
        }
    }

    // Survivors live in ranges[j..]; shift them to the front.
    ranges.drain(..j);
}
