//! Needle Index
//!
//! Secrets organised by their first byte. Looking needles up by the
//! incoming byte is much cheaper than filtering the whole set on every byte.
//! The index is rebuilt in full on every reset; partial matches keep their
//! own `Arc` to the needle, so a rebuild never invalidates them.

use std::sync::Arc;

/// A secret value to remove from the stream
pub type Needle = Arc<[u8]>;

/// Needles bucketed by leading byte
pub struct NeedleIndex {
    buckets: Vec<Vec<Needle>>,
    count: usize,
    longest: usize,
}

impl NeedleIndex {
    /// Build an index from a set of needles. Empty needles are skipped.
    pub fn new<I, N>(needles: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        let mut index = Self {
            buckets: vec![Vec::new(); 256],
            count: 0,
            longest: 0,
        };
        index.rebuild(needles);
        index
    }

    /// Replace every needle with a new set
    pub fn rebuild<I, N>(&mut self, needles: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<[u8]>,
    {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.count = 0;
        self.longest = 0;

        for needle in needles {
            let bytes = needle.as_ref();
            // An empty needle would match at every position.
            let Some(&first) = bytes.first() else {
                continue;
            };
            self.buckets[first as usize].push(Arc::from(bytes));
            self.count += 1;
            self.longest = self.longest.max(bytes.len());
        }
    }

    /// Needles beginning with `byte`, in registration order
    #[inline]
    pub fn starting_with(&self, byte: u8) -> &[Needle] {
        &self.buckets[byte as usize]
    }

    /// Number of registered needles
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Length of the longest registered needle
    pub fn longest(&self) -> usize {
        self.longest
    }
}

impl Default for NeedleIndex {
    fn default() -> Self {
        Self::new(std::iter::empty::<&[u8]>())
    }
}
