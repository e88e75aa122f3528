//! Generalized Jaccard similarity between two gene k-mer profiles
//!
//! The weighted Jaccard over two multisets is
//! `sum(min(a_i, b_i)) / sum(max(a_i, b_i))` across the union of their
//! supports. Both profiles are key-sorted, so the union is walked with two
//! cursors; keys present in only one profile never contribute to the
//! numerator and are accounted for in the denominator through the unmatched
//! multiplicity remainders. The walk stops as soon as the shorter profile's
//! cursor passes the longer profile's largest key.

use crate::genome::Gene;
use crate::kmer_container::KmerContainer;

/// Similarity score in [0, 1]
pub type Score = f64;

/// Similarity between two genes' k-mer profiles
///
/// Genes whose lengths differ by more than a factor of two score 0 without
/// touching the profiles; at that disparity the Jaccard upper bound is
/// trivially small. Profiles must have been built beforehand.
pub fn similarity(gene_a: &Gene, gene_b: &Gene) -> Score {
    let la = gene_a.sequence_len();
    let lb = gene_b.sequence_len();
    if la < lb / 2 || lb < la / 2 {
        return 0.0;
    }

    let guard_a = gene_a.kmers();
    let guard_b = gene_b.kmers();
    let (Some(a), Some(b)) = (guard_a.as_ref(), guard_b.as_ref()) else {
        debug_assert!(false, "k-mer profiles must be built before scoring");
        return 0.0;
    };
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // sweeping the profile with fewer distinct keys minimises cursor steps
    if a.distinct_count() <= b.distinct_count() {
        weighted_jaccard(a, b)
    } else {
        weighted_jaccard(b, a)
    }
}

/// Streaming weighted Jaccard over two non-empty, key-sorted profiles
///
/// `short` must be the profile with fewer (or equally many) distinct keys.
pub(crate) fn weighted_jaccard(short: &KmerContainer, long: &KmerContainer) -> Score {
    let long_largest = long.largest_key();
    let short_pairs = short.pairs();
    let long_pairs = long.pairs();

    let mut numerator: u64 = 0;
    let mut denominator: u64 = 0;
    let mut matched_short: u64 = 0;
    let mut matched_long: u64 = 0;

    let mut i = 0;
    let mut j = 0;
    while i < short_pairs.len() && j < long_pairs.len() {
        let (short_key, short_mult) = short_pairs[i];
        let (long_key, long_mult) = long_pairs[j];

        if short_key > long_largest {
            break;
        }

        if short_key < long_key {
            i += 1;
        } else if short_key > long_key {
            j += 1;
        } else {
            let a = short_mult as u64;
            let b = long_mult as u64;
            numerator += a.min(b);
            denominator += a.max(b);
            matched_short += a;
            matched_long += b;
            i += 1;
            j += 1;
        }
    }

    let unmatched_short = short.total_multiplicity() - matched_short;
    let unmatched_long = long.total_multiplicity() - matched_long;
    let divisor = denominator + unmatched_short + unmatched_long;
    if divisor == 0 {
        return 0.0;
    }
    numerator as Score / divisor as Score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::Gene;
    use crate::kmer_mapper::KmerMapper;

    fn built_gene(id: &str, seq: &[u8], k: usize, mapper: &KmerMapper) -> Gene {
        let gene = Gene::new(id, "g", 0, seq);
        gene.build_kmers(k, mapper);
        gene
    }

    #[test]
    fn test_identical_genes_score_one() {
        let mapper = KmerMapper::new();
        let a = built_gene("a", b"ABCABC", 3, &mapper);
        let b = built_gene("b", b"ABCABC", 3, &mapper);
        assert_eq!(similarity(&a, &b), 1.0);
        assert_eq!(similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_symmetry_and_bounds() {
        let mapper = KmerMapper::new();
        let a = built_gene("a", b"ABCABCXY", 3, &mapper);
        let b = built_gene("b", b"ABCXYZAB", 3, &mapper);
        let ab = similarity(&a, &b);
        let ba = similarity(&b, &a);
        assert_eq!(ab, ba);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_disjoint_profiles_score_zero() {
        let mapper = KmerMapper::new();
        let a = built_gene("a", b"AAAAA", 3, &mapper);
        let b = built_gene("b", b"CCCCC", 3, &mapper);
        assert_eq!(similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_length_filter() {
        let mapper = KmerMapper::new();
        // 100 symbols vs 49: 49 < 100/2 so the pair is filtered out even
        // though the shorter gene's k-mers all occur in the longer one
        let long = built_gene("a", &[b'A'; 100], 4, &mapper);
        let short = built_gene("b", &[b'A'; 49], 4, &mapper);
        assert_eq!(similarity(&long, &short), 0.0);
        assert_eq!(similarity(&short, &long), 0.0);

        // at exactly half the length the pair survives the filter
        let half = built_gene("c", &[b'A'; 50], 4, &mapper);
        assert!(similarity(&long, &half) > 0.0);
    }

    #[test]
    fn test_partial_overlap_exact_value() {
        let mapper = KmerMapper::new();
        // A = {ABC:2, BCA:1, CAB:1}, B = {ABC:1, BCX:1, CXY:1, XYZ:1}
        // shared ABC: num = 1, den = 2; unmatched = 2 + 3; score = 1/7
        let a = built_gene("a", b"ABCABC", 3, &mapper);
        let b = built_gene("b", b"ABCXYZ", 3, &mapper);
        assert_eq!(similarity(&a, &b), 1.0 / 7.0);
    }

    #[test]
    fn test_empty_profile_scores_zero() {
        let mapper = KmerMapper::new();
        let tiny = built_gene("a", b"AB", 3, &mapper);
        let other = built_gene("b", b"ABC", 3, &mapper);
        assert_eq!(similarity(&tiny, &other), 0.0);
        assert_eq!(similarity(&tiny, &tiny), 0.0);
    }

    #[test]
    fn test_early_exit_matches_plain_merge() {
        let mapper = KmerMapper::new();
        // long is built first so its keys are the small ones; the sparser
        // profile then holds keys past long's largest, forcing the merge to
        // stop right after the single shared key
        let long = built_gene("a", b"ABCDEFGH", 3, &mapper);
        let short = built_gene("b", b"ABCWWWW", 3, &mapper);
        // shared ABC: num = 1, den = 1; unmatched = 4 + 5
        assert_eq!(similarity(&short, &long), 1.0 / 10.0);
    }
}
