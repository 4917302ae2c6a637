// lib.rs - potts-prep library root

//! # potts-prep - Alignment statistics for Potts model inference
//!
//! This library turns a multiple sequence alignment into the statistics a
//! pairwise Potts model is fitted against: sequence weights, effective sample
//! size and weighted first- and second-order marginal frequencies.
//!
//! ## Features
//!
//! - **Focus mode**: restrict the alignment to the columns of a focus sequence
//! - **Neighborhood reweighting**: parallel pairwise identity scan with rayon
//! - **Gap-reduced marginals**: statistics conditioned on non-gap symbols
//! - **Sample size calibration**: Robbins-Monro matching of mutual information
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use potts_prep::prelude::*;
//!
//! let options = PipelineOptions {
//!     loader: LoaderOptions {
//!         focus: Some("BLAT_ECOLX".to_string()),
//!         ..Default::default()
//!     },
//!     theta: 0.2,
//!     ..Default::default()
//! };
//! let stats = run_pipeline_file(std::path::Path::new("alignment.fa"), &options)?;
//!
//! println!("{} sequences, nEff = {:.1}", stats.alignment.n_seqs(), stats.alignment.n_eff());
//! if let Some(fi) = stats.alignment.fi(0, 1) {
//!     println!("fi(0, 1) = {:.3}", fi);
//! }
//! # Ok::<(), potts_prep::PrepError>(())
//! ```

// Re-export all main modules
pub mod cli;
pub mod core;
pub mod data;
pub mod error;
pub mod output;

// Convenience prelude for common imports
pub mod prelude {
    pub use crate::cli::{validate_args, Args, ValidationResult};
    pub use crate::core::{count_marginals, estimate_sample_size, reweight};
    pub use crate::core::{run_pipeline, run_pipeline_file, PipelineOptions, Statistics};
    pub use crate::core::{MarginalMode, Parallelism, SampleSizeOptions};
    pub use crate::data::{Alignment, AlignmentLoader, Alphabet, LoaderOptions, Symbol};
    pub use crate::error::PrepError;
    pub use crate::output::{write_marginals, write_summary, write_weights};
}

// Re-export main types at the root level for convenience
pub use crate::cli::{Args, ValidationResult};
pub use crate::core::{MarginalMode, Parallelism, PipelineOptions, SampleSizeOptions, Statistics};
pub use crate::data::{Alignment, AlignmentLoader, Alphabet, LoaderOptions, Symbol};
pub use crate::error::PrepError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library information
pub fn get_info() -> String {
    format!(
        "potts-prep v{} - Alignment statistics for Potts model inference",
        VERSION
    )
}
