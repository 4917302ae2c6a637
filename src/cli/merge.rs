// merge.rs - Merge configuration file with CLI arguments

use crate::cli::{Args, Config};
use crate::data::AMINO_ACIDS;
use crate::error::Result;

impl Args {
    /// Merge with configuration from file
    /// CLI arguments take precedence over config file values
    pub fn merge_with_config(mut self, config: Config) -> Self {
        // Input/Output
        if self.alignment.is_none() {
            self.alignment = config.alignment;
        }
        if self.weights_out.is_none() {
            self.weights_out = config.weights_out;
        }
        if self.marginals_out.is_none() {
            self.marginals_out = config.marginals_out;
        }
        if self.summary_out.is_none() {
            self.summary_out = config.summary_out;
        }

        // Alignment processing (only override defaults, not explicit CLI values)
        if self.alphabet == AMINO_ACIDS {
            if let Some(alphabet) = config.alphabet {
                self.alphabet = alphabet;
            }
        }
        if self.focus.is_none() {
            self.focus = config.focus;
        }

        // Numeric settings (only override defaults)
        if self.theta == 0.2 {
            if let Some(theta) = config.theta {
                self.theta = theta;
            }
        }
        if self.scale == 1.0 {
            if let Some(scale) = config.scale {
                self.scale = scale;
            }
        }
        if self.iterations == 1000 {
            if let Some(iterations) = config.iterations {
                self.iterations = iterations;
            }
        }
        if self.batch_size == 100 {
            if let Some(batch_size) = config.batch_size {
                self.batch_size = batch_size;
            }
        }
        if self.learning_rate == 10.0 {
            if let Some(learning_rate) = config.learning_rate {
                self.learning_rate = learning_rate;
            }
        }
        if self.seed == 42 {
            if let Some(seed) = config.seed {
                self.seed = seed;
            }
        }

        // Performance
        if self.threads.is_none() {
            self.threads = config.threads;
        }

        // Flags (CLI flags take precedence, config only sets if not explicitly set)
        if !self.gap_reduce && config.gap_reduce.unwrap_or(false) {
            self.gap_reduce = true;
        }
        if !self.skip_sample_size && config.skip_sample_size.unwrap_or(false) {
            self.skip_sample_size = true;
        }
        if !self.sequential && config.sequential.unwrap_or(false) {
            self.sequential = true;
        }
        if !self.quiet && config.quiet.unwrap_or(false) {
            self.quiet = true;
        }
        if !self.dry_run && config.dry_run.unwrap_or(false) {
            self.dry_run = true;
        }

        self
    }

    /// Load configuration and merge with CLI args
    pub fn with_config_file(self, config_path: &str) -> Result<Self> {
        let config = Config::from_file(config_path)?;
        Ok(self.merge_with_config(config))
    }
}
