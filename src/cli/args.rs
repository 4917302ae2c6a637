// args.rs - Command line arguments definition

use argh::FromArgs;

#[derive(FromArgs)]
/// potts-prep - Sequence weights, effective sample size and marginals of an alignment
pub struct Args {
    /// path to the FASTA alignment
    #[argh(option)]
    pub alignment: Option<String>,

    /// alphabet, gap symbol first (default: -ACDEFGHIKLMNPQRSTVWY)
    #[argh(option, default = "String::from(crate::data::AMINO_ACIDS)")]
    pub alphabet: String,

    /// name prefix of the focus sequence; restricts columns to its aligned positions
    #[argh(option)]
    pub focus: Option<String>,

    /// neighborhood divergence for reweighting, outside 0.0-1.0 disables it (default: 0.2)
    #[argh(option, default = "0.2")]
    pub theta: f64,

    /// total weight shared by one sequence neighborhood (default: 1.0)
    #[argh(option, default = "1.0")]
    pub scale: f64,

    /// count marginals conditioned on non-gap symbols
    #[argh(switch)]
    pub gap_reduce: bool,

    /// keep the reweighted sample size, skip the mutual information calibration
    #[argh(switch)]
    pub skip_sample_size: bool,

    /// sample size estimator iterations (default: 1000)
    #[argh(option, default = "1000")]
    pub iterations: usize,

    /// site pairs per estimator iteration (default: 100)
    #[argh(option, default = "100")]
    pub batch_size: usize,

    /// estimator learning rate (default: 10.0)
    #[argh(option, default = "10.0")]
    pub learning_rate: f64,

    /// random seed of the estimator (default: 42)
    #[argh(option, default = "42")]
    pub seed: u64,

    /// number of threads (default: auto-detect)
    #[argh(option)]
    pub threads: Option<usize>,

    /// use the single-threaded symmetric reweighting scan
    #[argh(switch)]
    pub sequential: bool,

    /// write sequence weights (TSV)
    #[argh(option)]
    pub weights_out: Option<String>,

    /// write single-site marginals (TSV)
    #[argh(option)]
    pub marginals_out: Option<String>,

    /// write a JSON run summary
    #[argh(option)]
    pub summary_out: Option<String>,

    /// hide progress bars
    #[argh(switch)]
    pub quiet: bool,

    /// validate inputs and load the alignment without computation (dry run)
    #[argh(switch)]
    pub dry_run: bool,

    /// path to TOML configuration file
    #[argh(option)]
    pub config: Option<String>,

    /// generate sample configuration file and exit
    #[argh(switch)]
    pub generate_config: bool,
}
