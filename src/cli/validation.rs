// validation.rs - Input validation utilities

use crate::cli::args::Args;
use crate::core::{reweighting_enabled, MarginalMode, Parallelism, SampleSizeOptions};
use crate::data::{Alphabet, LoaderOptions};
use std::path::Path;

pub struct ValidationResult {
    pub alphabet: Alphabet,
    pub marginal_mode: MarginalMode,
    pub parallelism: Parallelism,
    pub sample_size: SampleSizeOptions,
    /// False when theta lies outside [0, 1]
    pub reweighting: bool,
}

impl ValidationResult {
    pub fn loader_options(&self, args: &Args) -> LoaderOptions {
        LoaderOptions {
            alphabet: self.alphabet.clone(),
            focus: args.focus.clone(),
            gap_reduce: self.marginal_mode == MarginalMode::GapReduced,
        }
    }
}

/// Validate all command line arguments
pub fn validate_args(args: &Args) -> Result<ValidationResult, String> {
    // Validate input file
    let alignment = args.alignment.as_ref().ok_or("--alignment is required")?;
    if !Path::new(alignment).is_file() {
        return Err(format!("Alignment file '{}' not found", alignment));
    }

    // Validate alphabet
    let alphabet = Alphabet::new(&args.alphabet).map_err(|e| e.to_string())?;
    let marginal_mode = if args.gap_reduce {
        if alphabet.len() < 2 {
            return Err("--gap-reduce needs at least one non-gap symbol".to_string());
        }
        MarginalMode::GapReduced
    } else {
        MarginalMode::Standard
    };

    // Validate reweighting parameters
    if !args.theta.is_finite() {
        return Err(format!("Theta must be a finite number, got {}", args.theta));
    }
    let reweighting = reweighting_enabled(args.theta);
    if !(args.scale > 0.0 && args.scale.is_finite()) {
        return Err(format!("Scale must be positive, got {}", args.scale));
    }

    if let Some(0) = args.threads {
        return Err("Thread count must be at least 1".to_string());
    }

    let sample_size = SampleSizeOptions {
        iterations: args.iterations,
        batch_size: args.batch_size,
        learning_rate: args.learning_rate,
        seed: args.seed,
        show_progress: !args.quiet,
        ..Default::default()
    };
    if !args.skip_sample_size && reweighting {
        sample_size.validate().map_err(|e| e.to_string())?;
    }

    let parallelism = if args.sequential {
        Parallelism::Sequential
    } else {
        Parallelism::Parallel
    };

    Ok(ValidationResult {
        alphabet,
        marginal_mode,
        parallelism,
        sample_size,
        reweighting,
    })
}
