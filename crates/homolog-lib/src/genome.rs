//! Genes, genomes and the ordered genome collection
//!
//! A [`Gene`] pairs an immutable sequence with an optional k-mer profile.
//! The profile slot is interior-mutable so an entire [`Genome`] can be built
//! or released behind a shared reference while worker-pool tasks hold clones
//! of the genome's `Arc`.

use crate::kmer_container::KmerContainer;
use crate::kmer_mapper::KmerMapper;
use rayon::prelude::*;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// One gene: identity, sequence and (optional) k-mer profile
///
/// `file_position` is an opaque identifier carried from the input to the
/// output edges.
#[derive(Debug)]
pub struct Gene {
    id: String,
    genome_id: String,
    file_position: u64,
    sequence: Box<[u8]>,
    kmers: RwLock<Option<KmerContainer>>,
}

impl Gene {
    /// Create a gene from its identity and raw sequence bytes
    pub fn new(
        id: impl Into<String>,
        genome_id: impl Into<String>,
        file_position: u64,
        sequence: impl Into<Box<[u8]>>,
    ) -> Self {
        Self {
            id: id.into(),
            genome_id: genome_id.into(),
            file_position,
            sequence: sequence.into(),
            kmers: RwLock::new(None),
        }
    }

    /// Gene identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Identifier of the genome this gene belongs to
    pub fn genome_id(&self) -> &str {
        &self.genome_id
    }

    /// Opaque input position, carried through to output edges
    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    /// Raw sequence bytes
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// Sequence length in symbols
    pub fn sequence_len(&self) -> usize {
        self.sequence.len()
    }

    /// Compute and store this gene's k-mer profile
    ///
    /// Rebuilding is idempotent for a fixed `(k, mapper)` pair; the previous
    /// profile, if any, is replaced.
    pub fn build_kmers(&self, k: usize, mapper: &KmerMapper) {
        let container = KmerContainer::from_sequence(&self.sequence, k, mapper);
        *self.kmers.write().unwrap_or_else(PoisonError::into_inner) = Some(container);
    }

    /// Release this gene's k-mer profile
    pub fn clear_kmers(&self) {
        *self.kmers.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Read access to the k-mer profile (`None` when not built)
    pub fn kmers(&self) -> RwLockReadGuard<'_, Option<KmerContainer>> {
        self.kmers.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// True if a k-mer profile is currently held
    pub fn has_kmers(&self) -> bool {
        self.kmers().is_some()
    }
}

/// An ordered list of genes with a stable identifier
#[derive(Debug)]
pub struct Genome {
    id: String,
    genes: Vec<Gene>,
}

impl Genome {
    /// Create a genome from its id and ordered genes
    pub fn new(id: impl Into<String>, genes: Vec<Gene>) -> Self {
        Self {
            id: id.into(),
            genes,
        }
    }

    /// Genome identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The genes in input order
    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    /// Number of genes
    pub fn size(&self) -> usize {
        self.genes.len()
    }

    /// True if the genome carries no genes
    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Build the k-mer profile of every gene, in parallel
    ///
    /// Genes are independent; only the mapper's intern table is shared and it
    /// serialises internally.
    pub fn build_all_kmers(&self, k: usize, mapper: &KmerMapper) {
        self.genes
            .par_iter()
            .for_each(|gene| gene.build_kmers(k, mapper));
    }

    /// Release every gene's k-mer profile
    pub fn clear_all_kmers(&self) {
        for gene in &self.genes {
            gene.clear_kmers();
        }
    }
}

/// Ordered collection of genomes for one run
///
/// Genomes are held behind `Arc` so the resolver can hand them to
/// worker-pool tasks without copying gene data.
#[derive(Debug, Default)]
pub struct GenomeSet {
    genomes: Vec<Arc<Genome>>,
}

impl GenomeSet {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a genome, preserving insertion order
    pub fn push(&mut self, genome: Genome) {
        self.genomes.push(Arc::new(genome));
    }

    /// The genomes in insertion order
    pub fn genomes(&self) -> &[Arc<Genome>] {
        &self.genomes
    }

    /// Number of genomes
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    /// True if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Total number of genes across all genomes
    pub fn total_genes(&self) -> usize {
        self.genomes.iter().map(|g| g.size()).sum()
    }
}

impl FromIterator<Genome> for GenomeSet {
    fn from_iter<I: IntoIterator<Item = Genome>>(iter: I) -> Self {
        Self {
            genomes: iter.into_iter().map(Arc::new).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gene(id: &str, pos: u64, seq: &[u8]) -> Gene {
        Gene::new(id, "g0", pos, seq)
    }

    #[test]
    fn test_kmer_lifecycle() {
        let mapper = KmerMapper::new();
        let g = gene("a", 0, b"ABCABC");
        assert!(!g.has_kmers());

        g.build_kmers(3, &mapper);
        assert!(g.has_kmers());
        {
            let guard = g.kmers();
            let profile = guard.as_ref().unwrap();
            assert_eq!(profile.total_multiplicity(), 4);
        }

        g.clear_kmers();
        assert!(!g.has_kmers());
    }

    #[test]
    fn test_genome_builds_all_genes() {
        let mapper = KmerMapper::new();
        let genome = Genome::new(
            "g0",
            vec![gene("a", 0, b"ABCABC"), gene("b", 1, b"XY"), gene("c", 2, b"ABCXYZ")],
        );
        genome.build_all_kmers(3, &mapper);
        assert!(genome.genes().iter().all(Gene::has_kmers));
        // the too-short gene holds an empty profile, not a missing one
        assert!(genome.genes()[1].kmers().as_ref().unwrap().is_empty());

        genome.clear_all_kmers();
        assert!(genome.genes().iter().all(|g| !g.has_kmers()));
    }

    #[test]
    fn test_genome_set_order_and_counts() {
        let set: GenomeSet = [
            Genome::new("g0", vec![gene("a", 0, b"AAAA")]),
            Genome::new("g1", vec![gene("b", 1, b"CCCC"), gene("c", 2, b"GGGG")]),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.total_genes(), 3);
        assert_eq!(set.genomes()[0].id(), "g0");
        assert_eq!(set.genomes()[1].id(), "g1");
    }
}
