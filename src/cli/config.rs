// config.rs - Configuration file support

use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Input/Output
    pub alignment: Option<String>,
    pub weights_out: Option<String>,
    pub marginals_out: Option<String>,
    pub summary_out: Option<String>,

    // Alignment processing
    pub alphabet: Option<String>,
    pub focus: Option<String>,
    pub gap_reduce: Option<bool>,

    // Reweighting
    pub theta: Option<f64>,
    pub scale: Option<f64>,

    // Sample size estimator
    pub skip_sample_size: Option<bool>,
    pub iterations: Option<usize>,
    pub batch_size: Option<usize>,
    pub learning_rate: Option<f64>,
    pub seed: Option<u64>,

    // Performance
    pub threads: Option<usize>,
    pub sequential: Option<bool>,

    // Flags
    pub quiet: Option<bool>,
    pub dry_run: Option<bool>,
}

impl Config {
    /// Create a new empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| PrepError::io(format!("reading config file '{}'", path.display()), e))?;
        Self::from_toml(&content)
            .map_err(|e| PrepError::toml(format!("parsing config file '{}'", path.display()), e))
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| PrepError::toml("serializing config", e))?;
        fs::write(path, content)
            .map_err(|e| PrepError::io(format!("writing config file '{}'", path.display()), e))
    }

    /// Generate a sample configuration file with comments
    pub fn generate_sample() -> String {
        r#"# potts-prep.toml - Configuration file for potts-prep
# Command line arguments will override these settings

# =============================================================================
# INPUT/OUTPUT
# =============================================================================

# FASTA alignment
alignment = "/path/to/alignment.fa"

# Sequence weights, one "name<TAB>weight" line per sequence
weights_out = "weights.tsv"

# Single-site marginals per site and symbol
marginals_out = "marginals.tsv"

# JSON run summary
summary_out = "summary.json"

# =============================================================================
# ALIGNMENT PROCESSING
# =============================================================================

# Alphabet, gap symbol first. The default amino acid alphabet enables
# protein handling: '.' reads as gap and lowercase focus columns are dropped
alphabet = "-ACDEFGHIKLMNPQRSTVWY"

# Name prefix of the focus sequence (NAME/START-END sets the numbering)
# focus = "BLAT_ECOLX"

# Count marginals conditioned on non-gap symbols
gap_reduce = false

# =============================================================================
# REWEIGHTING
# =============================================================================

# Sequences sharing at least (1 - theta) identical columns are neighbors.
# Values outside 0.0-1.0 disable reweighting and the sample size estimate
theta = 0.2

# Total weight shared by one neighborhood
scale = 1.0

# =============================================================================
# SAMPLE SIZE ESTIMATOR
# =============================================================================

skip_sample_size = false
iterations = 1000
batch_size = 100
learning_rate = 10.0
seed = 42

# =============================================================================
# PERFORMANCE
# =============================================================================

# Number of threads (omit for auto-detection)
# threads = 8

# Single-threaded symmetric reweighting scan
sequential = false

# =============================================================================
# FLAGS
# =============================================================================

# Hide progress bars
quiet = false

# Load and validate the alignment without computation (dry run)
dry_run = false
"#
        .to_string()
    }
}
