// pipeline.rs - Load, reweight, count and calibrate in one pass

use crate::core::marginals::{count_marginals, MarginalMode, MarginalSummary};
use crate::core::reweight::{reweight, reweighting_enabled, Parallelism, ReweightSummary};
use crate::core::sample_size::{estimate_sample_size, SampleSizeOptions, SampleSizeSummary};
use crate::data::{Alignment, AlignmentLoader, LoadReport, LoaderOptions};
use crate::error::Result;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Everything needed to turn an alignment file into statistics
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub loader: LoaderOptions,
    /// Neighborhood divergence; outside [0, 1] disables reweighting and the sample size estimate
    pub theta: f64,
    /// Total weight shared by a neighborhood
    pub scale: f64,
    pub parallelism: Parallelism,
    pub sample_size: SampleSizeOptions,
    pub skip_sample_size: bool,
    pub show_progress: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            loader: LoaderOptions::default(),
            theta: 0.2,
            scale: 1.0,
            parallelism: Parallelism::default(),
            sample_size: SampleSizeOptions::default(),
            skip_sample_size: false,
            show_progress: false,
        }
    }
}

impl PipelineOptions {
    pub fn marginal_mode(&self) -> MarginalMode {
        if self.loader.gap_reduce {
            MarginalMode::GapReduced
        } else {
            MarginalMode::Standard
        }
    }
}

/// A processed alignment together with the summaries of every stage
#[derive(Debug, Clone)]
pub struct Statistics {
    pub alignment: Alignment,
    pub load_report: LoadReport,
    pub reweight: ReweightSummary,
    pub marginals: MarginalSummary,
    /// `None` when the estimate was skipped or reweighting was disabled
    pub sample_size: Option<SampleSizeSummary>,
    pub theta: f64,
    pub scale: f64,
    pub gap_reduce: bool,
}

/// Run every stage on an alignment file
pub fn run_pipeline_file(path: &Path, options: &PipelineOptions) -> Result<Statistics> {
    let loader = AlignmentLoader::new(options.loader.clone());
    let (alignment, report) = loader.load_file(path)?;
    process(alignment, report, options)
}

/// Run every stage on a FASTA stream
pub fn run_pipeline<R: Read>(reader: R, options: &PipelineOptions) -> Result<Statistics> {
    let loader = AlignmentLoader::new(options.loader.clone());
    let (alignment, report) = loader.load(reader)?;
    process(alignment, report, options)
}

/// Reweight, count marginals and estimate the sample size of a loaded alignment
pub fn process(
    mut alignment: Alignment,
    load_report: LoadReport,
    options: &PipelineOptions,
) -> Result<Statistics> {
    let reweight_summary = reweight(
        &mut alignment,
        options.theta,
        options.scale,
        options.parallelism,
        options.show_progress,
    )?;

    let marginal_summary = count_marginals(&mut alignment, options.marginal_mode())?;

    let sample_size = if options.skip_sample_size {
        info!("sample size estimate skipped");
        None
    } else if reweighting_enabled(options.theta) {
        let sample_options = SampleSizeOptions {
            show_progress: options.show_progress,
            ..options.sample_size.clone()
        };
        Some(estimate_sample_size(&mut alignment, &sample_options)?)
    } else {
        None
    };

    Ok(Statistics {
        alignment,
        load_report,
        reweight: reweight_summary,
        marginals: marginal_summary,
        sample_size,
        theta: options.theta,
        scale: options.scale,
        gap_reduce: options.loader.gap_reduce,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Alphabet;
    use std::io::Cursor;

    fn options(alphabet: &str) -> PipelineOptions {
        PipelineOptions {
            loader: LoaderOptions {
                alphabet: Alphabet::new(alphabet).unwrap(),
                ..Default::default()
            },
            sample_size: SampleSizeOptions {
                iterations: 20,
                batch_size: 10,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_skip_leaves_reweighted_n_eff() {
        let fasta = ">a\nACAC\n>b\nACAC\n>c\nCACA\n";
        let opts = PipelineOptions {
            skip_sample_size: true,
            theta: 0.5,
            ..options("-AC")
        };
        let stats = run_pipeline(Cursor::new(fasta), &opts).unwrap();
        assert!(stats.sample_size.is_none());
        assert!((stats.alignment.n_eff() - 2.0).abs() < 1e-12);
        assert_eq!(stats.alignment.marginal_mode(), Some(MarginalMode::Standard));
    }

    #[test]
    fn test_theta_out_of_range_skips_estimate() {
        let fasta = ">a\nACAC\n>b\nACCA\n>c\nCCAA\n";
        let opts = PipelineOptions {
            theta: -1.0,
            ..options("-AC")
        };
        let stats = run_pipeline(Cursor::new(fasta), &opts).unwrap();
        assert!(!stats.reweight.applied);
        assert!(stats.sample_size.is_none());
        assert_eq!(stats.alignment.n_eff(), 3.0);
    }

    #[test]
    fn test_gap_reduce_selects_mode() {
        let fasta = ">a\nAC-C\n>b\nACCA\n>c\n-CAA\n>d\nCAAC\n";
        let opts = PipelineOptions {
            loader: LoaderOptions {
                alphabet: Alphabet::new("-AC").unwrap(),
                gap_reduce: true,
                ..Default::default()
            },
            ..options("-AC")
        };
        assert_eq!(opts.marginal_mode(), MarginalMode::GapReduced);
        let stats = run_pipeline(Cursor::new(fasta), &opts).unwrap();
        assert!(stats.gap_reduce);
        assert!(stats.alignment.is_gap_reduced());
        let summary = stats.sample_size.unwrap();
        assert!((stats.alignment.n_eff() - summary.n_eff).abs() < 1e-12);
    }
}
