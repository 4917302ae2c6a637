// reweight.rs - Sequence weights from inverse neighborhood density

use crate::data::Alignment;
use crate::error::{PrepError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// How the pairwise identity scan is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parallelism {
    /// One thread, each unordered pair visited once
    Sequential,
    /// Rayon over rows, each row counts its own neighbors
    #[default]
    Parallel,
}

/// Result of a reweighting pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReweightSummary {
    /// False when theta was outside [0, 1] and uniform weights were used
    pub applied: bool,
    pub theta: f64,
    pub scale: f64,
    pub n_eff: f64,
}

/// True when `theta` selects neighborhood reweighting
pub fn reweighting_enabled(theta: f64) -> bool {
    (0.0..=1.0).contains(&theta)
}

/// Number of identical columns between two rows
#[inline]
fn identity(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).filter(|(x, y)| x == y).count()
}

/// Set each weight to `scale / (1 + neighbors)`, where neighbors are the other
/// sequences sharing at least `(1 - theta) * n_sites` identical columns.
///
/// Theta outside `[0, 1]` disables reweighting: every weight becomes `scale`.
pub fn reweight(
    alignment: &mut Alignment,
    theta: f64,
    scale: f64,
    parallelism: Parallelism,
    show_progress: bool,
) -> Result<ReweightSummary> {
    if !(scale > 0.0 && scale.is_finite()) {
        return Err(PrepError::config(format!(
            "neighborhood scale must be positive, got {}",
            scale
        )));
    }

    let n_seqs = alignment.n_seqs();
    let applied = reweighting_enabled(theta);

    let weights = if applied {
        let neighbors = match parallelism {
            Parallelism::Sequential => neighbor_counts_sequential(alignment, theta, show_progress),
            Parallelism::Parallel => neighbor_counts_parallel(alignment, theta, show_progress),
        };
        neighbors
            .into_iter()
            .map(|count| scale / (1.0 + count as f64))
            .collect()
    } else {
        vec![scale; n_seqs]
    };
    alignment.set_weights(weights);

    if applied {
        info!(
            "neighborhood sample size: {:.1}\t({:.0}% identical neighborhood = {:.3} samples)",
            alignment.n_eff(),
            100.0 * (1.0 - theta),
            scale
        );
    } else {
        warn!("theta {} not between 0 and 1, no sequence reweighting applied", theta);
    }

    Ok(ReweightSummary {
        applied,
        theta,
        scale,
        n_eff: alignment.n_eff(),
    })
}

fn progress_bar(len: usize, show: bool) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} sequences ({percent}%) ETA: {eta}",
    ) {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}

/// Single-core scan exploiting symmetry: each unordered pair updates both sides
fn neighbor_counts_sequential(alignment: &Alignment, theta: f64, show_progress: bool) -> Vec<usize> {
    let n_seqs = alignment.n_seqs();
    let threshold = (1.0 - theta) * alignment.n_sites() as f64;
    let mut neighbors = vec![0usize; n_seqs];
    let pb = progress_bar(n_seqs, show_progress);

    for s in 0..n_seqs.saturating_sub(1) {
        let row_s = alignment.row(s);
        for t in s + 1..n_seqs {
            if identity(row_s, alignment.row(t)) as f64 >= threshold {
                neighbors[s] += 1;
                neighbors[t] += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    neighbors
}

/// Parallel scan over ordered pairs; every task writes only its own row's count
fn neighbor_counts_parallel(alignment: &Alignment, theta: f64, show_progress: bool) -> Vec<usize> {
    let n_seqs = alignment.n_seqs();
    let threshold = (1.0 - theta) * alignment.n_sites() as f64;
    let pb = progress_bar(n_seqs, show_progress);

    let update_interval = std::cmp::max(1, n_seqs / 100);
    let completed = AtomicUsize::new(0);

    let neighbors = (0..n_seqs)
        .into_par_iter()
        .map(|s| {
            let row_s = alignment.row(s);
            let count = (0..n_seqs)
                .filter(|&t| t != s && identity(row_s, alignment.row(t)) as f64 >= threshold)
                .count();

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % update_interval == 0 {
                pb.set_position(done as u64);
            }
            count
        })
        .collect();

    pb.finish_and_clear();
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Alphabet;

    fn alignment(rows: &[&str], alphabet: &str) -> Alignment {
        let alphabet = Alphabet::new(alphabet).unwrap();
        let n_sites = rows[0].len();
        let mut codes = Vec::new();
        for row in rows {
            for c in row.bytes() {
                codes.push(alphabet.encode(c).index().unwrap());
            }
        }
        let names = (0..rows.len()).map(|s| format!("s{}", s)).collect();
        Alignment::from_parts(alphabet, names, codes, n_sites, None, None).unwrap()
    }

    #[test]
    fn test_theta_outside_range_is_uniform() {
        for theta in [-1.0, 1.5] {
            let mut ali = alignment(&["AAAA", "AAAA", "CCCC"], "-AC");
            let summary = reweight(&mut ali, theta, 0.5, Parallelism::Sequential, false).unwrap();
            assert!(!summary.applied);
            assert!(ali.weights().iter().all(|&w| w == 0.5));
            assert!((ali.n_eff() - 1.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_identical_pair_splits_scale() {
        let mut ali = alignment(&["ACCA", "ACCA"], "-AC");
        reweight(&mut ali, 0.2, 2.0, Parallelism::Sequential, false).unwrap();
        assert_eq!(ali.weights(), &[1.0, 1.0]);
        assert!((ali.n_eff() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // 3 of 4 columns identical, theta 0.25 requires >= 3
        let mut ali = alignment(&["AAAA", "AAAC", "CCCC"], "-AC");
        reweight(&mut ali, 0.25, 1.0, Parallelism::Sequential, false).unwrap();
        assert_eq!(ali.weights(), &[0.5, 0.5, 1.0]);
        assert!((ali.n_eff() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let rows = [
            "AC-AC-AC", "AC-AC-AA", "CCCCCCCC", "AC-AC-CC", "A--AC-AC", "CAAAAAAC", "AC-AA-AC",
        ];
        for theta in [0.0, 0.2, 0.3, 0.5, 1.0] {
            let mut seq = alignment(&rows, "-AC");
            let mut par = seq.clone();
            reweight(&mut seq, theta, 1.0, Parallelism::Sequential, false).unwrap();
            reweight(&mut par, theta, 1.0, Parallelism::Parallel, false).unwrap();
            assert_eq!(seq.weights(), par.weights());
            assert_eq!(seq.n_eff(), par.n_eff());
        }
    }

    #[test]
    fn test_theta_one_makes_everything_neighbors() {
        let mut ali = alignment(&["AAAA", "CCCC", "----"], "-AC");
        reweight(&mut ali, 1.0, 1.0, Parallelism::Parallel, false).unwrap();
        for &w in ali.weights() {
            assert!((w - 1.0 / 3.0).abs() < 1e-12);
        }
        assert!((ali.n_eff() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let mut ali = alignment(&["AAAA"], "-AC");
        assert!(reweight(&mut ali, 0.2, 0.0, Parallelism::Sequential, false).is_err());
        assert!(reweight(&mut ali, 0.2, f64::NAN, Parallelism::Sequential, false).is_err());
    }
}
