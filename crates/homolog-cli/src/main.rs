use anyhow::Context;
use clap::Parser;
use homolog_lib::{BbhConfiguration, BbhResolver, Gene, Genome, GenomeSet, KmerMode};
use needletail::parse_fastx_file;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "homolog")]
#[command(version = "0.1.0")]
#[command(about = "Bidirectional best hits over k-mer profiles", long_about = None)]
struct Cli {
    /// Input FASTA files, one genome per file
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// K-mer length
    #[arg(short, long)]
    k: usize,

    /// Number of worker threads (0 = all available cores)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// Output path prefix; the `.net` extension is appended
    #[arg(short, long, default_value = "homolog")]
    output: PathBuf,

    /// Build every genome's k-mer profiles up front instead of per pair
    /// (faster on small inputs, unbounded peak memory)
    #[arg(long, default_value = "false")]
    eager: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = BbhConfiguration {
        k: cli.k,
        num_threads: cli.threads,
        output_path: cli.output,
        mode: if cli.eager {
            KmerMode::Eager
        } else {
            KmerMode::Lazy
        },
    };
    config.print();

    // initialisation errors (invalid k, unwritable output, pool start
    // failure) surface here and exit non-zero before any input is read
    let resolver = BbhResolver::new(&config)?;

    let genomes = load_genomes(&cli.inputs)?;
    info!(
        "loaded {} genomes, {} genes",
        genomes.len(),
        genomes.total_genes()
    );

    resolver.run(&genomes);
    info!("done: {} edges in {:?}", resolver.edges_written(), resolver.output_path());

    Ok(())
}

/// Parse each FASTA file as one genome
///
/// The genome id is the file stem; gene ids come from record headers; each
/// gene's file position is its global record index across all inputs, in
/// input order, so positions in the output identify genes uniquely.
fn load_genomes(paths: &[PathBuf]) -> anyhow::Result<GenomeSet> {
    let mut set = GenomeSet::new();
    let mut next_position: u64 = 0;

    for path in paths {
        let genome_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("genome")
            .to_string();
        let mut reader =
            parse_fastx_file(path).with_context(|| format!("failed to open {}", path.display()))?;

        let mut genes = Vec::new();
        while let Some(record) = reader.next() {
            let record =
                record.with_context(|| format!("malformed record in {}", path.display()))?;
            let gene_id = std::str::from_utf8(record.id())
                .unwrap_or_default()
                .split_whitespace()
                .next()
                .unwrap_or("")
                .to_string();
            let gene_id = if gene_id.is_empty() {
                format!("gene-{next_position}")
            } else {
                gene_id
            };
            genes.push(Gene::new(
                gene_id,
                genome_id.clone(),
                next_position,
                record.seq().into_owned(),
            ));
            next_position += 1;
        }

        if genes.is_empty() {
            warn!("{}: no sequences found", path.display());
        }
        set.push(Genome::new(genome_id, genes));
    }

    Ok(set)
}
