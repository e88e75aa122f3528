//! Interning of k-mer substrings to dense integer keys
//!
//! A [`KmerMapper`] assigns each distinct k-mer seen during a batch a dense
//! non-negative key in first-seen order, so identical substrings in any gene
//! receive the same key and profiles can be compared on integers instead of
//! strings. The table is consulted only while profiles are being built;
//! similarity computation never touches it.

use ahash::AHashMap;
use std::sync::{Mutex, PoisonError};

/// Dense integer key assigned to a distinct k-mer
pub type KmerKey = u64;

/// Thread-safe k-mer interning table
///
/// Profiles for distinct genes may be built concurrently, so the table is
/// guarded by a mutex. Callers hold the lock once per distinct k-mer of a
/// gene, not once per window (see
/// [`KmerContainer::from_sequence`](crate::kmer_container::KmerContainer::from_sequence)).
#[derive(Debug, Default)]
pub struct KmerMapper {
    table: Mutex<AHashMap<Box<[u8]>, KmerKey>>,
}

impl KmerMapper {
    /// Create an empty mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the key for `kmer`, assigning the next unused key if unseen
    pub fn intern(&self, kmer: &[u8]) -> KmerKey {
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(&key) = table.get(kmer) {
            return key;
        }
        let key = table.len() as KmerKey;
        table.insert(kmer.into(), key);
        key
    }

    /// Number of distinct k-mers interned so far
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if no k-mer has been interned yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
