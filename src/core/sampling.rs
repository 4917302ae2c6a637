// sampling.rs - Discrete sampling primitives and plug-in mutual information

use rand::Rng;
use rand_distr::{Distribution, Gamma};

/// Running sum of a probability vector
pub fn cumulative(p: &[f64]) -> Vec<f64> {
    p.iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Invert a discrete CDF: the first index whose cumulative mass exceeds `u`.
///
/// `u` is a uniform draw on `[0, 1)`. Zero-mass states are never returned;
/// when rounding leaves the total mass below `u`, the last state with
/// positive mass is used.
pub fn sample_index(cdf: &[f64], u: f64) -> usize {
    debug_assert!(!cdf.is_empty());
    let k = cdf.partition_point(|&c| c <= u);
    if k < cdf.len() {
        return k;
    }
    // Walk back to the last state that carries mass
    let mut last = cdf.len() - 1;
    while last > 0 && cdf[last] <= cdf[last - 1] {
        last -= 1;
    }
    last
}

/// Round `x >= 0` to an integer whose expectation is `x`:
/// `floor(x)` plus one with probability equal to the fractional part
pub fn stochastic_round(x: f64, u: f64) -> usize {
    let floor = x.floor();
    floor as usize + usize::from(u < x - floor)
}

/// Draw a categorical distribution given integer counts.
///
/// Each observed state receives an independent `Gamma(count, 1)` draw and the
/// draws are normalised, i.e. a Dirichlet posterior restricted to the states
/// that were actually observed. Unobserved states keep zero probability.
/// Returns `None` when there are no counts at all.
pub fn sample_categorical<R: Rng + ?Sized>(counts: &[f64], rng: &mut R) -> Option<Vec<f64>> {
    let mut p: Vec<f64> = counts
        .iter()
        .map(|&c| {
            if c > 0.0 {
                Gamma::new(c, 1.0).map_or(0.0, |g| g.sample(rng))
            } else {
                0.0
            }
        })
        .collect();
    let total: f64 = p.iter().sum();
    if !(total > 0.0) {
        return None;
    }
    for x in &mut p {
        *x /= total;
    }
    Some(p)
}

/// Plug-in mutual information of a joint table (row-major, `q_i × q_j`)
/// against the supplied single-site marginals. Zero cells are skipped.
pub fn mutual_information_with(joint: &[f64], p_i: &[f64], p_j: &[f64]) -> f64 {
    let q_j = p_j.len();
    debug_assert_eq!(joint.len(), p_i.len() * q_j);
    let mut mi = 0.0;
    for (a, &pa) in p_i.iter().enumerate() {
        for (b, &pb) in p_j.iter().enumerate() {
            let f = joint[a * q_j + b];
            if f > 0.0 {
                mi += f * (f.ln() - pa.ln() - pb.ln());
            }
        }
    }
    mi
}

/// Plug-in mutual information of a joint table using its own marginals
pub fn mutual_information(joint: &[f64], q_i: usize, q_j: usize) -> f64 {
    debug_assert_eq!(joint.len(), q_i * q_j);
    let mut p_i = vec![0.0; q_i];
    let mut p_j = vec![0.0; q_j];
    for a in 0..q_i {
        for b in 0..q_j {
            let f = joint[a * q_j + b];
            p_i[a] += f;
            p_j[b] += f;
        }
    }
    mutual_information_with(joint, &p_i, &p_j)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_cumulative() {
        assert_eq!(cumulative(&[0.25, 0.0, 0.75]), vec![0.25, 0.25, 1.0]);
    }

    #[test]
    fn test_sample_index_inverts_cdf() {
        let cdf = cumulative(&[0.2, 0.3, 0.5]);
        assert_eq!(sample_index(&cdf, 0.0), 0);
        assert_eq!(sample_index(&cdf, 0.19), 0);
        assert_eq!(sample_index(&cdf, 0.2), 1);
        assert_eq!(sample_index(&cdf, 0.49), 1);
        assert_eq!(sample_index(&cdf, 0.5), 2);
        assert_eq!(sample_index(&cdf, 0.999), 2);
    }

    #[test]
    fn test_sample_index_skips_zero_mass() {
        let cdf = cumulative(&[0.0, 0.0, 1.0, 0.0]);
        assert_eq!(sample_index(&cdf, 0.0), 2);
        assert_eq!(sample_index(&cdf, 0.7), 2);

        // Total mass short of u through rounding
        let cdf = vec![0.3, 0.9999, 0.9999];
        assert_eq!(sample_index(&cdf, 0.99995), 1);
    }

    #[test]
    fn test_sample_index_frequencies() {
        let p = [0.1, 0.6, 0.3];
        let cdf = cumulative(&p);
        let mut rng = StdRng::seed_from_u64(7);
        let mut hits = [0usize; 3];
        let n = 100_000;
        for _ in 0..n {
            hits[sample_index(&cdf, rng.gen::<f64>())] += 1;
        }
        for (h, &expected) in hits.iter().zip(&p) {
            assert!((*h as f64 / n as f64 - expected).abs() < 0.01);
        }
    }

    #[test]
    fn test_stochastic_round() {
        assert_eq!(stochastic_round(3.0, 0.0), 3);
        assert_eq!(stochastic_round(3.25, 0.2), 4);
        assert_eq!(stochastic_round(3.25, 0.3), 3);
        assert_eq!(stochastic_round(0.0, 0.0), 0);

        let mut rng = StdRng::seed_from_u64(1);
        let n = 50_000;
        let total: usize = (0..n).map(|_| stochastic_round(2.4, rng.gen())).sum();
        assert!((total as f64 / n as f64 - 2.4).abs() < 0.02);
    }

    #[test]
    fn test_sample_categorical_keeps_support() {
        let mut rng = StdRng::seed_from_u64(3);
        let p = sample_categorical(&[0.0, 5.0, 0.0, 10.0], &mut rng).unwrap();
        assert_eq!(p[0], 0.0);
        assert_eq!(p[2], 0.0);
        assert!(p[1] > 0.0 && p[3] > 0.0);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);

        assert!(sample_categorical(&[0.0, 0.0], &mut rng).is_none());
    }

    #[test]
    fn test_sample_categorical_concentrates_with_counts() {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 2_000;
        let mean: f64 = (0..trials)
            .map(|_| sample_categorical(&[300.0, 700.0], &mut rng).unwrap()[0])
            .sum::<f64>()
            / trials as f64;
        assert!((mean - 0.3).abs() < 0.01);
    }

    #[test]
    fn test_mutual_information() {
        // Independent table
        let independent = [0.25, 0.25, 0.25, 0.25];
        assert!(mutual_information(&independent, 2, 2).abs() < 1e-12);

        // Perfectly coupled binary sites carry ln 2
        let coupled = [0.5, 0.0, 0.0, 0.5];
        assert!((mutual_information(&coupled, 2, 2) - 2f64.ln()).abs() < 1e-12);
    }
}
