// mod.rs - Core statistics module

pub mod marginals;
pub mod pipeline;
pub mod reweight;
pub mod sample_size;
pub mod sampling;

// Re-export main types for convenience
pub use marginals::{count_marginals, MarginalMode, MarginalSummary, Marginals};
pub use pipeline::{process, run_pipeline, run_pipeline_file, PipelineOptions, Statistics};
pub use reweight::{reweight, reweighting_enabled, Parallelism, ReweightSummary};
pub use sample_size::{
    average_mutual_information, estimate_sample_size, SampleSizeOptions, SampleSizeSummary,
};
