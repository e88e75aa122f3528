//! Sparse per-gene k-mer profile
//!
//! A [`KmerContainer`] is the multiset of a gene's overlapping length-k
//! windows, stored as (key, multiplicity) pairs sorted by key. The sorted
//! order is what allows [`crate::similarity`] to merge two profiles with two
//! cursors and terminate early on the key bounds.

use crate::kmer_mapper::{KmerKey, KmerMapper};
use ahash::AHashMap;

/// Occurrence count of a k-mer within one gene
pub type Multiplicity = u32;

/// Sparse, key-sorted k-mer multiset for one gene
///
/// Invariants: keys strictly increasing, multiplicities > 0, and
/// `total_multiplicity == L - k + 1` for a gene of length `L >= k`.
#[derive(Debug, Clone, Default)]
pub struct KmerContainer {
    /// (key, multiplicity) pairs, sorted ascending by key
    pairs: Box<[(KmerKey, Multiplicity)]>,
    /// Sum of all multiplicities (number of length-k windows)
    total_multiplicity: u64,
}

impl KmerContainer {
    /// Build the profile of `sequence` for k-mer length `k`
    ///
    /// Every length-k window is interned through `mapper` at its first
    /// occurrence in the gene, so the mapper sees windows in first-seen
    /// order; repeats only bump the local multiplicity. A sequence shorter
    /// than `k` produces an empty container.
    ///
    /// # Example
    /// ```
    /// use homolog_lib::{KmerContainer, KmerMapper};
    ///
    /// let mapper = KmerMapper::new();
    /// let profile = KmerContainer::from_sequence(b"AAAA", 2, &mapper);
    /// assert_eq!(profile.total_multiplicity(), 3);
    /// assert_eq!(profile.distinct_count(), 1);
    /// ```
    pub fn from_sequence(sequence: &[u8], k: usize, mapper: &KmerMapper) -> Self {
        debug_assert!(k > 0, "k-mer length must be positive");
        if sequence.len() < k {
            return Self::default();
        }

        let window_count = sequence.len() - k + 1;
        let mut counts: AHashMap<&[u8], (KmerKey, Multiplicity)> =
            AHashMap::with_capacity(window_count);
        for window in sequence.windows(k) {
            counts
                .entry(window)
                .and_modify(|(_, mult)| *mult += 1)
                .or_insert_with(|| (mapper.intern(window), 1));
        }

        let mut pairs: Vec<(KmerKey, Multiplicity)> =
            counts.into_iter().map(|(_, pair)| pair).collect();
        pairs.sort_unstable_by_key(|&(key, _)| key);

        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            pairs: pairs.into_boxed_slice(),
            total_multiplicity: window_count as u64,
        }
    }

    /// The (key, multiplicity) pairs, sorted ascending by key
    pub fn pairs(&self) -> &[(KmerKey, Multiplicity)] {
        &self.pairs
    }

    /// True if the gene had no length-k window
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of distinct k-mers
    pub fn distinct_count(&self) -> usize {
        self.pairs.len()
    }

    /// Sum of multiplicities; equals `L - k + 1` for a gene of length `L`
    pub fn total_multiplicity(&self) -> u64 {
        self.total_multiplicity
    }

    /// Smallest key in the profile
    ///
    /// Querying an empty container is a programming error.
    pub fn smallest_key(&self) -> KmerKey {
        debug_assert!(!self.is_empty(), "key bounds of an empty k-mer profile");
        self.pairs[0].0
    }

    /// Largest key in the profile
    ///
    /// Querying an empty container is a programming error.
    pub fn largest_key(&self) -> KmerKey {
        debug_assert!(!self.is_empty(), "key bounds of an empty k-mer profile");
        self.pairs[self.pairs.len() - 1].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_kmer_multiplicity() {
        let mapper = KmerMapper::new();
        let profile = KmerContainer::from_sequence(b"AAAA", 2, &mapper);
        assert_eq!(profile.pairs(), &[(0, 3)]);
        assert_eq!(profile.total_multiplicity(), 3);
        assert_eq!(profile.distinct_count(), 1);
        assert_eq!(profile.smallest_key(), 0);
        assert_eq!(profile.largest_key(), 0);
    }

    #[test]
    fn test_window_count_invariant() {
        let mapper = KmerMapper::new();
        for (seq, k) in [
            (b"ABCABC".as_slice(), 3usize),
            (b"ABCDEFGH", 2),
            (b"AAAAAAAAAA", 4),
        ] {
            let profile = KmerContainer::from_sequence(seq, k, &mapper);
            assert_eq!(profile.total_multiplicity(), (seq.len() - k + 1) as u64);
            let sum: u64 = profile.pairs().iter().map(|&(_, m)| m as u64).sum();
            assert_eq!(sum, profile.total_multiplicity());
        }
    }

    #[test]
    fn test_short_sequence_is_empty() {
        let mapper = KmerMapper::new();
        let profile = KmerContainer::from_sequence(b"AB", 3, &mapper);
        assert!(profile.is_empty());
        assert_eq!(profile.total_multiplicity(), 0);
        assert_eq!(profile.distinct_count(), 0);
    }

    #[test]
    fn test_keys_sorted_strictly_increasing() {
        let mapper = KmerMapper::new();
        // interleave two genes so mapper keys do not arrive pre-sorted
        let _other = KmerContainer::from_sequence(b"XYZXYZXYZ", 3, &mapper);
        let profile = KmerContainer::from_sequence(b"ABCXYZABC", 3, &mapper);
        let keys: Vec<_> = profile.pairs().iter().map(|&(k, _)| k).collect();
        for w in keys.windows(2) {
            assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn test_partial_overlap_profiles() {
        let mapper = KmerMapper::new();
        let a = KmerContainer::from_sequence(b"ABCABC", 3, &mapper);
        let b = KmerContainer::from_sequence(b"ABCXYZ", 3, &mapper);
        // A: ABC x2, BCA, CAB; B: ABC, BCX, CXY, XYZ
        assert_eq!(a.distinct_count(), 3);
        assert_eq!(a.total_multiplicity(), 4);
        assert_eq!(b.distinct_count(), 4);
        assert_eq!(b.total_multiplicity(), 4);
        // the shared key ABC was first seen in gene a
        let abc = mapper.intern(b"ABC");
        assert!(a.pairs().iter().any(|&(k, m)| k == abc && m == 2));
        assert!(b.pairs().iter().any(|&(k, m)| k == abc && m == 1));
    }
}
