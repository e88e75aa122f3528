//! Run configuration for BBH detection
//!
//! Gathers the parameters a [`crate::resolver::BbhResolver`] needs: k-mer
//! length, worker pool size, output path prefix and the k-mer lifecycle mode.

use crate::constants::DEFAULT_K;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for configuration validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The k-mer length is zero
    #[error("k must be a positive integer, got k={0}")]
    InvalidK(usize),
    /// The output path prefix is empty
    #[error("output path prefix must not be empty")]
    EmptyOutputPath,
}

/// K-mer profile lifecycle across the genome comparison loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KmerMode {
    /// Build profiles just before each genome pair and release them right
    /// after; at most two genomes' profiles are resident at any time
    #[default]
    Lazy,
    /// Build every genome's profiles up front; each is released only after
    /// its outer-loop iteration completes
    Eager,
}

/// Configuration parameters for a BBH run
#[derive(Debug, Clone)]
pub struct BbhConfiguration {
    /// K-mer length (must be >= 1)
    pub k: usize,

    /// Number of worker threads (0 = all available cores)
    pub num_threads: usize,

    /// Output path prefix; the `.net` extension is appended
    pub output_path: PathBuf,

    /// K-mer lifecycle mode
    pub mode: KmerMode,
}

impl Default for BbhConfiguration {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            num_threads: 0, // 0 = use all available cores
            output_path: PathBuf::from("homolog"),
            mode: KmerMode::Lazy,
        }
    }
}

impl BbhConfiguration {
    /// Create a configuration with the specified k-mer length
    pub fn new(k: usize) -> Result<Self, ConfigError> {
        let config = Self {
            k,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::InvalidK(self.k));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputPath);
        }
        Ok(())
    }

    /// Number of worker threads after resolving 0 to the hardware parallelism
    pub fn resolved_threads(&self) -> usize {
        if self.num_threads > 0 {
            self.num_threads
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Run Configuration:");
        tracing::info!("  k = {}", self.k);
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
        tracing::info!("  output = {:?}", self.output_path);
        tracing::info!("  mode = {:?}", self.mode);
    }
}
