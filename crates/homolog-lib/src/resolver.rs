//! Two-phase Bidirectional Best Hit resolution
//!
//! For every ordered genome pair (including each genome against itself) the
//! resolver runs:
//!
//! 1. a **row phase**: one worker-pool task per row gene scores the whole
//!    row of the pair's matrix and folds each score into that row's
//!    candidate record;
//! 2. a **column phase**: the candidate records are inverted into the set
//!    of columns any row considers best, and one task per such column scans
//!    it for its own best rows, emitting an edge exactly when row and column
//!    agree on the score.
//!
//! The phases are separated by the pool's completion fence, which gives every
//! matrix write a happens-before edge to every column-phase read. Matrix and
//! candidates live only for the duration of one pair; k-mer profiles are
//! built and released around the pair loop according to the configured mode.

use crate::candidates::BbhCandidatesContainer;
use crate::config::{BbhConfiguration, ConfigError, KmerMode};
use crate::genome::{Genome, GenomeSet};
use crate::kmer_mapper::KmerMapper;
use crate::output_writer::OutputWriter;
use crate::score_matrix::ScoreMatrix;
use crate::similarity::{similarity, Score};
use crate::worker_pool::WorkerPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Initialisation errors; once `run` starts, failures inside tasks are
/// logged and the run continues
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Invalid configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The output file could not be opened
    #[error("failed to open output file: {0}")]
    Output(#[source] std::io::Error),
    /// The worker pool could not be started
    #[error("failed to start worker pool: {0}")]
    Pool(#[source] std::io::Error),
}

/// Drives BBH detection for a genome collection
pub struct BbhResolver {
    k: usize,
    mode: KmerMode,
    // declared before the writer: workers join (and release their writer
    // handles) before the writer's final flush
    pool: WorkerPool,
    writer: Arc<OutputWriter>,
}

impl BbhResolver {
    /// Validate the configuration, open the output file and start the pool
    pub fn new(config: &BbhConfiguration) -> Result<Self, ResolverError> {
        config.validate()?;
        let pool = WorkerPool::new(config.resolved_threads()).map_err(ResolverError::Pool)?;
        let writer =
            Arc::new(OutputWriter::create(&config.output_path).map_err(ResolverError::Output)?);
        Ok(Self {
            k: config.k,
            mode: config.mode,
            pool,
            writer,
        })
    }

    /// Path of the `.net` output file
    pub fn output_path(&self) -> &Path {
        self.writer.path()
    }

    /// Number of edges written so far
    pub fn edges_written(&self) -> u64 {
        self.writer.lines_written()
    }

    /// Resolve BBH edges for every genome pair of the collection
    pub fn run(&self, genomes: &GenomeSet) {
        let started = Instant::now();
        info!(
            "resolving bidirectional best hits across {} genomes ({} genes, k = {})",
            genomes.len(),
            genomes.total_genes(),
            self.k
        );

        match self.mode {
            KmerMode::Lazy => self.run_lazy(genomes),
            KmerMode::Eager => self.run_eager(genomes),
        }

        if let Err(e) = self.writer.flush() {
            warn!("failed to flush output file {:?}: {e}", self.writer.path());
        }
        info!(
            "wrote {} edges to {:?} in {:.2?}",
            self.writer.lines_written(),
            self.writer.path(),
            started.elapsed()
        );
    }

    /// Lazy driver: at most two genomes' k-mer profiles are resident
    fn run_lazy(&self, genomes: &GenomeSet) {
        let list = genomes.genomes();
        for i in 0..list.len() {
            // keys only need to be consistent among profiles alive at the
            // same time, so each outer genome opens a fresh key space
            let mapper = KmerMapper::new();
            let row_genome = &list[i];
            row_genome.build_all_kmers(self.k, &mapper);
            self.resolve_same_genome(row_genome);

            for col_genome in &list[i + 1..] {
                col_genome.build_all_kmers(self.k, &mapper);
                self.resolve_genome_pair(row_genome, col_genome);
                col_genome.clear_all_kmers();
            }
            row_genome.clear_all_kmers();
        }
    }

    /// Eager driver: every profile is built up front in a single key space
    fn run_eager(&self, genomes: &GenomeSet) {
        let list = genomes.genomes();
        {
            let mapper = KmerMapper::new();
            for genome in list {
                genome.build_all_kmers(self.k, &mapper);
            }
            info!("interned {} distinct {}-mers", mapper.len(), self.k);
        }

        for i in 0..list.len() {
            let row_genome = &list[i];
            self.resolve_same_genome(row_genome);
            for col_genome in &list[i + 1..] {
                self.resolve_genome_pair(row_genome, col_genome);
            }
            row_genome.clear_all_kmers();
        }
    }

    /// Score and resolve one different-genome pair
    fn resolve_genome_pair(&self, row_genome: &Arc<Genome>, col_genome: &Arc<Genome>) {
        let rows = row_genome.size();
        let cols = col_genome.size();
        debug!(
            "comparing genome {} against {} ({rows} x {cols})",
            row_genome.id(),
            col_genome.id()
        );

        let matrix = Arc::new(ScoreMatrix::new(rows, cols));
        let candidates = Arc::new(BbhCandidatesContainer::new(rows));
        self.fill_rows(row_genome, col_genome, &matrix, &candidates, false);
        self.emit_best_hits(row_genome, col_genome, &matrix, &candidates, false);
    }

    /// Score and resolve a genome against itself (strict upper triangle)
    fn resolve_same_genome(&self, genome: &Arc<Genome>) {
        let n = genome.size();
        debug!("comparing genome {} against itself ({n} x {n})", genome.id());

        let matrix = Arc::new(ScoreMatrix::new(n, n));
        let candidates = Arc::new(BbhCandidatesContainer::new(n));
        self.fill_rows(genome, genome, &matrix, &candidates, true);
        self.emit_best_hits(genome, genome, &matrix, &candidates, true);
    }

    /// Row phase: each task fills `matrix[row, ·]` and `candidates[row]`
    ///
    /// Rows are mutually independent; the only synchronisation is the fence
    /// at the end. For same-genome pairs only columns past the diagonal are
    /// computed, leaving the rest at zero.
    fn fill_rows(
        &self,
        row_genome: &Arc<Genome>,
        col_genome: &Arc<Genome>,
        matrix: &Arc<ScoreMatrix>,
        candidates: &Arc<BbhCandidatesContainer>,
        same_genome: bool,
    ) {
        for row in 0..row_genome.size() {
            let row_genome = Arc::clone(row_genome);
            let col_genome = Arc::clone(col_genome);
            let matrix = Arc::clone(matrix);
            let candidates = Arc::clone(candidates);
            self.pool.submit(move || {
                let row_gene = &row_genome.genes()[row];
                let mut cells = matrix.lock_row(row);
                let mut best = candidates.lock_row(row);
                let first_col = if same_genome { row + 1 } else { 0 };
                for (offset, col_gene) in col_genome.genes()[first_col..].iter().enumerate() {
                    let col = first_col + offset;
                    let score = similarity(row_gene, col_gene);
                    cells[col] = score;
                    best.update(col, score);
                }
            });
        }
        self.pool.wait_idle();
    }

    /// Column phase: emit the edges whose row and column agree
    ///
    /// Only columns present in some row's candidate list are scanned; the
    /// scan itself covers every row (restricted to rows above the diagonal
    /// for same-genome pairs) so a column's best may well sit outside the
    /// candidate rows that nominated it, in which case nothing is emitted
    /// for those rows.
    fn emit_best_hits(
        &self,
        row_genome: &Arc<Genome>,
        col_genome: &Arc<Genome>,
        matrix: &Arc<ScoreMatrix>,
        candidates: &Arc<BbhCandidatesContainer>,
        same_genome: bool,
    ) {
        let col_to_rows = candidates.invert();
        debug!(
            "{} of {} columns are candidates",
            col_to_rows.len(),
            col_genome.size()
        );

        for (col, _candidate_rows) in col_to_rows {
            let row_genome = Arc::clone(row_genome);
            let col_genome = Arc::clone(col_genome);
            let matrix = Arc::clone(matrix);
            let candidates = Arc::clone(candidates);
            let writer = Arc::clone(&self.writer);
            self.pool.submit(move || {
                let row_limit = if same_genome { col } else { row_genome.size() };

                let mut col_best: Score = 0.0;
                let mut best_rows: Vec<usize> = Vec::new();
                for row in 0..row_limit {
                    let score = matrix.get(row, col);
                    if score > col_best {
                        col_best = score;
                        best_rows.clear();
                        best_rows.push(row);
                    } else if score == col_best && col_best > 0.0 {
                        best_rows.push(row);
                    }
                }
                if col_best <= 0.0 {
                    return;
                }

                let col_position = col_genome.genes()[col].file_position();
                for row in best_rows {
                    if col_best == candidates.best_score_for(row) {
                        let row_position = row_genome.genes()[row].file_position();
                        if let Err(e) = writer.write_edge(row_position, col_position, col_best) {
                            warn!("failed to write edge {row_position},{col_position}: {e}");
                        }
                    }
                }
            });
        }
        self.pool.wait_idle();
    }
}
