// alignment.rs - Encoded alignment matrix and its statistics

use crate::core::marginals::{MarginalMode, Marginals};
use crate::data::alphabet::Alphabet;
use crate::error::{PrepError, Result};

/// Index of the unordered site pair `(i, j)`, `i < j`, in upper-triangle order
#[inline]
pub fn pair_index(i: usize, j: usize, n_sites: usize) -> usize {
    debug_assert!(i < j && j < n_sites, "pair ({}, {}) out of range", i, j);
    i * (2 * n_sites - i - 1) / 2 + (j - i - 1)
}

/// Multiple sequence alignment with sequence weights and marginal tables.
///
/// Codes are stored row-major (`n_seqs × n_sites`) and always lie in
/// `[0, n_codes)`: out-of-alphabet rows are dropped and lowercase cells are
/// normalised by the loader before an `Alignment` exists.
#[derive(Debug, Clone)]
pub struct Alignment {
    alphabet: Alphabet,
    n_seqs: usize,
    n_sites: usize,
    sequences: Vec<u8>,
    names: Vec<String>,
    target: Option<usize>,
    offsets: Option<Vec<usize>>,
    weights: Vec<f64>,
    n_eff: f64,
    marginals: Option<Marginals>,
}

impl Alignment {
    /// Build an alignment from already encoded rows.
    ///
    /// Weights start at 1.0 so that `n_eff == n_seqs`.
    pub fn from_parts(
        alphabet: Alphabet,
        names: Vec<String>,
        sequences: Vec<u8>,
        n_sites: usize,
        target: Option<usize>,
        offsets: Option<Vec<usize>>,
    ) -> Result<Self> {
        let n_seqs = names.len();
        if n_seqs == 0 || n_sites == 0 {
            return Err(PrepError::format(format!(
                "alignment must have at least one sequence and one site ({} × {})",
                n_seqs, n_sites
            )));
        }
        if sequences.len() != n_seqs * n_sites {
            return Err(PrepError::format(format!(
                "matrix holds {} cells, expected {} sequences × {} sites",
                sequences.len(),
                n_seqs,
                n_sites
            )));
        }
        if let Some(bad) = sequences.iter().find(|&&c| c as usize >= alphabet.len()) {
            return Err(PrepError::format(format!(
                "code {} outside alphabet of {} symbols",
                bad,
                alphabet.len()
            )));
        }
        if let Some(t) = target {
            if t >= n_seqs {
                return Err(PrepError::format(format!(
                    "focus index {} outside {} sequences",
                    t, n_seqs
                )));
            }
        }
        if let Some(ref offsets) = offsets {
            if offsets.len() != n_sites {
                return Err(PrepError::format(format!(
                    "{} offsets for {} sites",
                    offsets.len(),
                    n_sites
                )));
            }
        }

        Ok(Self {
            alphabet,
            n_seqs,
            n_sites,
            sequences,
            names,
            target,
            offsets,
            weights: vec![1.0; n_seqs],
            n_eff: n_seqs as f64,
            marginals: None,
        })
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn n_seqs(&self) -> usize {
        self.n_seqs
    }

    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    /// Size of the full alphabet, gap included
    pub fn n_codes(&self) -> usize {
        self.alphabet.len()
    }

    /// Number of states per site in the marginal tables:
    /// the full alphabet, or the alphabet without gap once gap-reduced
    /// marginals have been counted
    pub fn model_codes(&self) -> usize {
        match &self.marginals {
            Some(m) => m.n_codes,
            None => self.n_codes(),
        }
    }

    pub fn n_pairs(&self) -> usize {
        self.n_sites * (self.n_sites - 1) / 2
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn name(&self, s: usize) -> &str {
        &self.names[s]
    }

    /// Index of the focus sequence in the reduced alignment
    pub fn target(&self) -> Option<usize> {
        self.target
    }

    /// 1-based positions of the retained columns in the original numbering
    pub fn offsets(&self) -> Option<&[usize]> {
        self.offsets.as_deref()
    }

    /// Code at sequence `s`, site `i`
    #[inline]
    pub fn seq(&self, s: usize, i: usize) -> u8 {
        debug_assert!(s < self.n_seqs && i < self.n_sites);
        self.sequences[s * self.n_sites + i]
    }

    /// All codes of sequence `s`
    #[inline]
    pub fn row(&self, s: usize) -> &[u8] {
        debug_assert!(s < self.n_seqs);
        &self.sequences[s * self.n_sites..(s + 1) * self.n_sites]
    }

    /// Sequence `s` decoded back to characters
    pub fn row_string(&self, s: usize) -> String {
        self.row(s).iter().map(|&c| self.alphabet.letter(c)).collect()
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn n_eff(&self) -> f64 {
        self.n_eff
    }

    /// Replace all weights and recompute `n_eff` as their sum
    pub(crate) fn set_weights(&mut self, weights: Vec<f64>) {
        debug_assert_eq!(weights.len(), self.n_seqs);
        self.n_eff = weights.iter().sum();
        self.weights = weights;
    }

    /// Multiply all weights by `ratio` and set `n_eff` to `n_eff`
    pub(crate) fn rescale_weights(&mut self, ratio: f64, n_eff: f64) {
        for w in &mut self.weights {
            *w *= ratio;
        }
        self.n_eff = n_eff;
    }

    pub(crate) fn set_marginals(&mut self, marginals: Marginals) {
        self.marginals = Some(marginals);
    }

    pub fn marginals(&self) -> Option<&Marginals> {
        self.marginals.as_ref()
    }

    /// Marginal convention in use, once marginals have been counted
    pub fn marginal_mode(&self) -> Option<MarginalMode> {
        self.marginals.as_ref().map(|m| m.mode)
    }

    pub fn is_gap_reduced(&self) -> bool {
        self.marginal_mode() == Some(MarginalMode::GapReduced)
    }

    /// First-order marginal at site `i`, state `a`, once marginals are counted
    #[inline]
    pub fn fi(&self, i: usize, a: usize) -> Option<f64> {
        self.marginals.as_ref().map(|m| m.fi(i, a))
    }

    /// Second-order marginal at sites `i < j`, states `a`, `b`
    #[inline]
    pub fn fij(&self, i: usize, j: usize, a: usize, b: usize) -> Option<f64> {
        self.marginals.as_ref().map(|m| m.fij(i, j, a, b))
    }

    /// Row of `fi` for site `i`
    pub fn fi_row(&self, i: usize) -> Option<&[f64]> {
        self.marginals.as_ref().map(|m| m.fi_row(i))
    }

    /// `q × q` block of `fij` for sites `i < j`
    pub fn fij_block(&self, i: usize, j: usize) -> Option<&[f64]> {
        self.marginals.as_ref().map(|m| m.fij_block(i, j))
    }

    /// Weighted gap frequency at site `i` (gap-reduced marginals only)
    pub fn gapi(&self, i: usize) -> Option<f64> {
        self.marginals.as_ref().and_then(|m| m.gapi(i))
    }

    /// Weighted frequency of sequences ungapped at both `i < j` (gap-reduced marginals only)
    pub fn ungapij(&self, i: usize, j: usize) -> Option<f64> {
        self.marginals.as_ref().and_then(|m| m.ungapij(i, j))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> Alignment {
        let alphabet = Alphabet::new("-AB").unwrap();
        Alignment::from_parts(
            alphabet,
            vec!["s1".to_string(), "s2".to_string()],
            vec![1, 2, 0, 2, 2, 1],
            3,
            None,
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_pair_index_is_dense() {
        let n = 6;
        let mut expected = 0;
        for i in 0..n - 1 {
            for j in i + 1..n {
                assert_eq!(pair_index(i, j, n), expected);
                expected += 1;
            }
        }
        assert_eq!(expected, n * (n - 1) / 2);
    }

    #[test]
    fn test_accessors() {
        let ali = toy();
        assert_eq!(ali.n_seqs(), 2);
        assert_eq!(ali.n_sites(), 3);
        assert_eq!(ali.n_codes(), 3);
        assert_eq!(ali.seq(1, 0), 2);
        assert_eq!(ali.row(0), &[1, 2, 0]);
        assert_eq!(ali.row_string(0), "AB-");
        assert_eq!(ali.n_eff(), 2.0);
        assert!(ali.marginal_mode().is_none());
        assert!(ali.fi_row(0).is_none());
        assert!(ali.fij(0, 1, 1, 1).is_none());
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let alphabet = Alphabet::new("-AB").unwrap();
        assert!(Alignment::from_parts(alphabet.clone(), vec![], vec![], 0, None, None).is_err());
        assert!(Alignment::from_parts(
            alphabet.clone(),
            vec!["a".into()],
            vec![1, 2],
            3,
            None,
            None
        )
        .is_err());
        assert!(Alignment::from_parts(
            alphabet,
            vec!["a".into()],
            vec![1, 3, 1],
            3,
            None,
            None
        )
        .is_err());
    }

    #[test]
    fn test_weights_update_n_eff() {
        let mut ali = toy();
        ali.set_weights(vec![0.5, 0.25]);
        assert!((ali.n_eff() - 0.75).abs() < 1e-12);
        ali.rescale_weights(2.0, 1.5);
        assert_eq!(ali.weights(), &[1.0, 0.5]);
        assert_eq!(ali.n_eff(), 1.5);
    }
}
