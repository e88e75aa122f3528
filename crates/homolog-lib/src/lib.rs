// homolog: Bidirectional Best Hits over k-mer profiles
//
// Genes are decomposed into interned k-mer multisets, scored pairwise with a
// streaming Generalized Jaccard, and resolved into mutually-best edges on a
// fixed-size worker pool.

#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod candidates;
pub mod config;
pub mod constants;
pub mod genome;
pub mod kmer_container;
pub mod kmer_mapper;
pub mod output_writer;
pub mod resolver;
pub mod score_matrix;
pub mod similarity;
pub mod worker_pool;

// Re-export common types at crate root
pub use candidates::{BbhCandidate, BbhCandidatesContainer};
pub use config::{BbhConfiguration, ConfigError, KmerMode};
pub use genome::{Gene, Genome, GenomeSet};
pub use kmer_container::{KmerContainer, Multiplicity};
pub use kmer_mapper::{KmerKey, KmerMapper};
pub use output_writer::OutputWriter;
pub use resolver::{BbhResolver, ResolverError};
pub use score_matrix::ScoreMatrix;
pub use similarity::{similarity, Score};
pub use worker_pool::WorkerPool;

/// Version information
pub fn version() -> (u8, u8, u8) {
    constants::VERSION
}
