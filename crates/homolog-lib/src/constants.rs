//! Crate-wide constants

/// Library version (major, minor, patch)
pub const VERSION: (u8, u8, u8) = (0, 1, 0);

/// Extension appended to the output path prefix
pub const OUTPUT_EXTENSION: &str = "net";

/// Default k-mer length used by [`crate::config::BbhConfiguration::default`]
pub const DEFAULT_K: usize = 6;
