// marginals.rs - Weighted first- and second-order marginal frequencies

use crate::data::{pair_index, Alignment, GAP};
use crate::error::{pair_table_len, zeroed_table, PrepError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

/// Convention used for the marginal tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginalMode {
    /// Every symbol, gap included, weighted by `1 / nEff`
    Standard,
    /// Gap excluded from the states; tables conditioned on non-gap
    GapReduced,
}

impl FromStr for MarginalMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" | "full" => Ok(MarginalMode::Standard),
            "gap-reduced" | "gapreduce" | "gap-reduce" => Ok(MarginalMode::GapReduced),
            _ => Err(format!(
                "Invalid marginal mode: {}. Use: standard, gap-reduced",
                s
            )),
        }
    }
}

impl MarginalMode {
    pub fn description(&self) -> &str {
        match self {
            MarginalMode::Standard => "standard (gap as a state)",
            MarginalMode::GapReduced => "gap-reduced (conditioned on non-gap)",
        }
    }
}

/// Marginal tables attached to an [`Alignment`]
#[derive(Debug, Clone)]
pub struct Marginals {
    pub mode: MarginalMode,
    pub n_sites: usize,
    /// States per site in `fi`/`fij`
    pub n_codes: usize,
    /// `n_sites × n_codes`
    pub fi: Vec<f64>,
    /// `n_pairs × n_codes × n_codes`, pairs in upper-triangle order
    pub fij: Vec<f64>,
    /// Gap frequency per site (gap-reduced only)
    pub gapi: Option<Vec<f64>>,
    /// Frequency of rows ungapped at both sites, per pair (gap-reduced only)
    pub ungapij: Option<Vec<f64>>,
}

impl Marginals {
    /// First-order marginal at site `i`, state `a`
    #[inline]
    pub fn fi(&self, i: usize, a: usize) -> f64 {
        debug_assert!(i < self.n_sites && a < self.n_codes);
        self.fi[i * self.n_codes + a]
    }

    /// Second-order marginal at sites `i < j`, states `a`, `b`
    #[inline]
    pub fn fij(&self, i: usize, j: usize, a: usize, b: usize) -> f64 {
        debug_assert!(a < self.n_codes && b < self.n_codes);
        let q = self.n_codes;
        self.fij[pair_index(i, j, self.n_sites) * q * q + a * q + b]
    }

    pub fn fi_row(&self, i: usize) -> &[f64] {
        &self.fi[i * self.n_codes..(i + 1) * self.n_codes]
    }

    /// `q × q` block of `fij` for sites `i < j`, row-major in the state of `i`
    pub fn fij_block(&self, i: usize, j: usize) -> &[f64] {
        let q2 = self.n_codes * self.n_codes;
        let p = pair_index(i, j, self.n_sites);
        &self.fij[p * q2..(p + 1) * q2]
    }

    pub fn gapi(&self, i: usize) -> Option<f64> {
        self.gapi.as_ref().map(|g| g[i])
    }

    pub fn ungapij(&self, i: usize, j: usize) -> Option<f64> {
        let n_sites = self.n_sites;
        self.ungapij.as_ref().map(|u| u[pair_index(i, j, n_sites)])
    }

    /// True when gap-reduced counting found no sequence ungapped at both `i < j`,
    /// so the `fij` block is a uniform placeholder
    pub fn is_degenerate_pair(&self, i: usize, j: usize) -> bool {
        self.ungapij(i, j).map_or(false, |u| u <= 0.0)
    }
}

/// Counts of sites and pairs that had no mass and were set to uniform
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MarginalSummary {
    pub n_codes: usize,
    pub degenerate_sites: usize,
    pub degenerate_pairs: usize,
}

/// Compute `fi`/`fij` (and `gapi`/`ungapij` when gap-reduced) from the current weights
pub fn count_marginals(alignment: &mut Alignment, mode: MarginalMode) -> Result<MarginalSummary> {
    if !(alignment.n_eff() > 0.0) {
        return Err(PrepError::degenerate(format!(
            "effective sample size must be positive to count marginals, got {}",
            alignment.n_eff()
        )));
    }
    let (marginals, summary) = match mode {
        MarginalMode::Standard => standard_marginals(alignment)?,
        MarginalMode::GapReduced => gap_reduced_marginals(alignment)?,
    };
    debug!(
        "counted {} marginals: {} sites × {} states",
        mode.description(),
        alignment.n_sites(),
        marginals.n_codes
    );
    alignment.set_marginals(marginals);
    Ok(summary)
}

fn standard_marginals(alignment: &Alignment) -> Result<(Marginals, MarginalSummary)> {
    let n_sites = alignment.n_sites();
    let q = alignment.n_codes();
    let z_inv = 1.0 / alignment.n_eff();

    let mut fi = zeroed_table("fi", n_sites * q)?;
    let mut fij = zeroed_table("fij", pair_table_len("fij", n_sites, q * q)?)?;

    for (s, &weight) in alignment.weights().iter().enumerate() {
        let row = alignment.row(s);
        let w = weight * z_inv;
        for (i, &a) in row.iter().enumerate() {
            fi[i * q + a as usize] += w;
        }
        for i in 0..n_sites.saturating_sub(1) {
            let a = row[i] as usize;
            for j in i + 1..n_sites {
                let p = pair_index(i, j, n_sites);
                fij[p * q * q + a * q + row[j] as usize] += w;
            }
        }
    }

    let marginals = Marginals {
        mode: MarginalMode::Standard,
        n_sites,
        n_codes: q,
        fi,
        fij,
        gapi: None,
        ungapij: None,
    };
    let summary = MarginalSummary {
        n_codes: q,
        ..Default::default()
    };
    Ok((marginals, summary))
}

fn gap_reduced_marginals(alignment: &Alignment) -> Result<(Marginals, MarginalSummary)> {
    let n_sites = alignment.n_sites();
    let n_codes = alignment.n_codes();
    if n_codes < 2 {
        return Err(PrepError::config(
            "gap-reduced marginals need at least one non-gap symbol",
        ));
    }
    let q = n_codes - 1;
    let z_inv = 1.0 / alignment.n_eff();

    let mut gapi = zeroed_table("gapi", n_sites)?;
    let mut ungapij = zeroed_table("ungapij", pair_table_len("ungapij", n_sites, 1)?)?;
    let mut fi = zeroed_table("fi", n_sites * q)?;
    let mut fij = zeroed_table("fij", pair_table_len("fij", n_sites, q * q)?)?;

    for (s, &w) in alignment.weights().iter().enumerate() {
        let row = alignment.row(s);
        for (i, &a) in row.iter().enumerate() {
            if a == GAP {
                gapi[i] += w;
            } else {
                fi[i * q + a as usize - 1] += w;
            }
        }
        for i in 0..n_sites.saturating_sub(1) {
            if row[i] == GAP {
                continue;
            }
            let a = row[i] as usize - 1;
            for j in i + 1..n_sites {
                if row[j] == GAP {
                    continue;
                }
                let p = pair_index(i, j, n_sites);
                ungapij[p] += w;
                fij[p * q * q + a * q + row[j] as usize - 1] += w;
            }
        }
    }
    for g in &mut gapi {
        *g *= z_inv;
    }
    for u in &mut ungapij {
        *u *= z_inv;
    }

    // Condition on non-gap: each row/block divided by its own total
    let mut summary = MarginalSummary {
        n_codes: q,
        ..Default::default()
    };
    for (i, site) in fi.chunks_mut(q).enumerate() {
        if !normalize(site) {
            warn!("site {} is fully gapped, using uniform conditional marginals", i + 1);
            summary.degenerate_sites += 1;
        }
    }
    for block in fij.chunks_mut(q * q) {
        if !normalize(block) {
            summary.degenerate_pairs += 1;
        }
    }
    if summary.degenerate_pairs > 0 {
        warn!(
            "{} site pairs share no ungapped sequence, using uniform conditional marginals",
            summary.degenerate_pairs
        );
    }

    let marginals = Marginals {
        mode: MarginalMode::GapReduced,
        n_sites,
        n_codes: q,
        fi,
        fij,
        gapi: Some(gapi),
        ungapij: Some(ungapij),
    };
    Ok((marginals, summary))
}

/// Scale `values` to sum to one; with no mass, fill uniformly and return false
fn normalize(values: &mut [f64]) -> bool {
    let total: f64 = values.iter().sum();
    if total > 0.0 {
        let inv = 1.0 / total;
        for v in values.iter_mut() {
            *v *= inv;
        }
        true
    } else {
        let uniform = 1.0 / values.len() as f64;
        values.iter_mut().for_each(|v| *v = uniform);
        false
    }
}
