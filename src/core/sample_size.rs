// sample_size.rs - Effective sample size by Robbins-Monro mutual information matching

use crate::core::sampling::{
    cumulative, mutual_information, mutual_information_with, sample_categorical, sample_index,
    stochastic_round,
};
use crate::core::marginals::{MarginalMode, Marginals};
use crate::data::Alignment;
use crate::error::{PrepError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings for the stochastic approximation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizeOptions {
    pub iterations: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub seed: u64,
    /// Log progress every this many iterations (0 disables)
    pub report_every: usize,
    #[serde(skip)]
    pub show_progress: bool,
}

impl Default for SampleSizeOptions {
    fn default() -> Self {
        Self {
            iterations: 1000,
            batch_size: 100,
            learning_rate: 10.0,
            seed: 42,
            report_every: 50,
            show_progress: false,
        }
    }
}

impl SampleSizeOptions {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(PrepError::config("iterations must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(PrepError::config("batch size must be at least 1"));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(PrepError::config(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Outcome of the estimator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SampleSizeSummary {
    /// Mean plug-in mutual information over all site pairs
    pub avg_mi: f64,
    pub previous_n_eff: f64,
    pub n_eff: f64,
    /// Factor applied to every weight
    pub ratio: f64,
}

/// Average plug-in mutual information over all site pairs of the counted marginals.
///
/// Gap-reduced pairs with no sequence ungapped at both sites add nothing but
/// still count in the average.
pub fn average_mutual_information(marginals: &Marginals) -> f64 {
    let n_sites = marginals.n_sites;
    if n_sites < 2 {
        return 0.0;
    }
    let mut total = 0.0;
    for i in 0..n_sites - 1 {
        for j in i + 1..n_sites {
            if marginals.is_degenerate_pair(i, j) {
                continue;
            }
            total += mutual_information_with(
                marginals.fij_block(i, j),
                marginals.fi_row(i),
                marginals.fi_row(j),
            );
        }
    }
    total / (n_sites * (n_sites - 1) / 2) as f64
}

/// Sites that can be drawn: positive marginal mass and, when gap-reduced, not fully gapped
fn informative_sites(marginals: &Marginals) -> Vec<usize> {
    (0..marginals.n_sites)
        .filter(|&i| marginals.fi_row(i).iter().sum::<f64>() > 0.0)
        .filter(|&i| marginals.gapi(i).map_or(true, |g| g < 1.0))
        .collect()
}

/// Simulated mutual information of one pair under sample size `n_local`
struct PairSampler<'a> {
    marginals: &'a Marginals,
    q: usize,
    joint: Vec<f64>,
}

impl<'a> PairSampler<'a> {
    fn new(marginals: &'a Marginals) -> Self {
        let q = marginals.n_codes;
        Self {
            marginals,
            q,
            joint: vec![0.0; q * q],
        }
    }

    /// Per-site distribution drawn around the rounded counts `n * fi`
    fn site_distribution<R: Rng>(&self, site: usize, n: f64, rng: &mut R) -> Vec<f64> {
        let fi = self.marginals.fi_row(site);
        let counts: Vec<f64> = fi.iter().map(|&f| (n * f).round()).collect();
        // Too few draws to populate any state: fall back to the marginal itself
        sample_categorical(&counts, rng).unwrap_or_else(|| fi.to_vec())
    }

    fn sample_mi<R: Rng>(&mut self, i: usize, j: usize, n_local: f64, rng: &mut R) -> f64 {
        let n = stochastic_round(n_local, rng.gen::<f64>());
        if n == 0 {
            return 0.0;
        }

        let cdf_i = cumulative(&self.site_distribution(i, n as f64, rng));
        let cdf_j = cumulative(&self.site_distribution(j, n as f64, rng));

        let q = self.q;
        self.joint.iter_mut().for_each(|f| *f = 0.0);
        let inv_n = 1.0 / n as f64;
        for _ in 0..n {
            let a = sample_index(&cdf_i, rng.gen::<f64>());
            let b = sample_index(&cdf_j, rng.gen::<f64>());
            self.joint[a * q + b] += inv_n;
        }
        mutual_information(&self.joint, q, q)
    }
}

/// Rescale the weights so that `n_eff` matches the number of independent
/// categorical draws whose expected pairwise mutual information equals the
/// alignment's average mutual information.
///
/// Marginals must already be counted. Runs single-threaded with a seeded RNG,
/// so results are reproducible for a fixed seed.
pub fn estimate_sample_size(
    alignment: &mut Alignment,
    options: &SampleSizeOptions,
) -> Result<SampleSizeSummary> {
    options.validate()?;
    let marginals = alignment.marginals().ok_or_else(|| {
        PrepError::config("marginals must be counted before estimating the sample size")
    })?;
    let sites = informative_sites(marginals);
    if sites.len() < 2 {
        return Err(PrepError::degenerate(format!(
            "{} informative sites, at least 2 are needed to estimate the sample size",
            sites.len()
        )));
    }

    let avg_mi = average_mutual_information(marginals);
    let previous_n_eff = alignment.n_eff();
    let gap_reduced = marginals.mode == MarginalMode::GapReduced;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut log_n = previous_n_eff.ln();

    let pb = if options.show_progress {
        let pb = ProgressBar::new(options.iterations as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} iterations {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut sampler = PairSampler::new(marginals);
    for t in 0..options.iterations {
        let n = log_n.exp();
        let mut sample_mi = 0.0;
        for _ in 0..options.batch_size {
            let i = sites[rng.gen_range(0..sites.len())];
            let mut j = i;
            while j == i {
                j = sites[rng.gen_range(0..sites.len())];
            }

            let mut n_local = n;
            if gap_reduced {
                let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                n_local *= marginals.ungapij(lo, hi).unwrap_or(1.0);
            }
            sample_mi += sampler.sample_mi(i, j, n_local, &mut rng);
        }
        sample_mi /= options.batch_size as f64;

        if options.report_every > 0 && t % options.report_every == options.report_every - 1 {
            debug!("{:8}\t{:8.3}\t{:8.2}", t + 1, sample_mi, n);
            pb.set_message(format!("N = {:.1}", n));
        }
        pb.inc(1);

        // Robbins-Monro step on log N
        log_n += (sample_mi - avg_mi) * (options.learning_rate / (t + 1) as f64);
    }
    pb.finish_and_clear();

    let n_eff = log_n.exp();
    let ratio = n_eff / previous_n_eff;
    alignment.rescale_weights(ratio, n_eff);

    info!(
        "effective sample size: {:.1}\t(average MI {:.4}, weights scaled by {:.3})",
        n_eff, avg_mi, ratio
    );

    Ok(SampleSizeSummary {
        avg_mi,
        previous_n_eff,
        n_eff,
        ratio,
    })
}
