//! Random variates for the sampler: discrete draws over weight vectors and
//! the stick-breaking draw of mixture weights.

use rand::Rng;
use rv::dist::{Beta, BetaError};
use rv::traits::Sampleable;

use crate::error::WeightsError;

/// Check every weight is finite and non-negative.
fn check_entries(weights: &[f64]) -> Result<(), WeightsError> {
    if weights.is_empty() {
        return Err(WeightsError::Empty);
    }

    for (index, &value) in weights.iter().enumerate() {
        if value.is_nan() {
            return Err(WeightsError::NotANumber { index });
        }
        if value.is_infinite() {
            return Err(WeightsError::Infinite { index });
        }
        if value < 0.0 {
            return Err(WeightsError::Negative { index, value });
        }
    }
    Ok(())
}

/// Check the entries and return their sum, which must be positive and finite.
fn checked_total(weights: &[f64]) -> Result<f64, WeightsError> {
    check_entries(weights)?;

    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() {
        Err(WeightsError::InvalidSum { sum })
    } else if sum == 0.0 {
        Err(WeightsError::AllZero)
    } else {
        Ok(sum)
    }
}

/// Draw an index `k` with probability `weights[k] / sum(weights)`.
///
/// The weights need not be normalized. A single uniform draw `u` on
/// `(0, sum]` is compared against the running cumulative weight and the first
/// index whose cumulative weight reaches `u` is returned, so zero weights are
/// never selected.
///
/// # Errors
/// If the vector is empty, has a NaN, infinite or negative entry, or does not
/// sum to a positive finite value.
pub fn draw_index<R: Rng>(weights: &[f64], rng: &mut R) -> Result<usize, WeightsError> {
    let total = checked_total(weights)?;
    let u = (1.0 - rng.random::<f64>()) * total;

    let mut cumulative = 0.0;
    for (k, w) in weights.iter().enumerate() {
        cumulative += w;
        if cumulative >= u {
            return Ok(k);
        }
    }

    // Only reachable through round-off in the cumulative sum.
    weights
        .iter()
        .rposition(|w| *w > 0.0)
        .ok_or(WeightsError::AllZero)
}

/// Rescale `p` so its largest entry is one.
///
/// The maximum is taken after the whole vector is known. This keeps the
/// relative magnitudes the multinomial draw needs while avoiding underflow
/// when every density is tiny.
///
/// The entries are never summed, so finite vectors whose total would
/// overflow are still accepted.
///
/// # Errors
/// If an entry is NaN, infinite or negative, or every entry is zero.
pub fn normalize_by_max(mut p: Vec<f64>) -> Result<Vec<f64>, WeightsError> {
    check_entries(&p)?;
    let max = p.iter().copied().fold(0.0, f64::max);
    if max == 0.0 {
        return Err(WeightsError::AllZero);
    }
    p.iter_mut().for_each(|x| *x /= max);
    Ok(p)
}

/// Rescale `p` to sum to one.
///
/// # Errors
/// Same conditions as [`draw_index`].
pub fn normalize_by_sum(mut p: Vec<f64>) -> Result<Vec<f64>, WeightsError> {
    let total = checked_total(&p)?;
    p.iter_mut().for_each(|x| *x /= total);
    Ok(p)
}

/// Truncated stick-breaking process conditioned on component occupancy.
///
/// Component `k` breaks off `v_k ~ Beta(1 + c_k, alpha + sum_{j > k} c_j)` of
/// the stick that remains after components `0..k`.
struct StickBreakingProcess<'a, R>
where
    R: Rng,
{
    alpha: f64,
    counts: std::slice::Iter<'a, usize>,
    rest: usize,
    remaining: f64,
    rng: &'a mut R,
}

impl<'a, R: Rng> StickBreakingProcess<'a, R> {
    fn new(alpha: f64, counts: &'a [usize], rng: &'a mut R) -> Self {
        Self {
            alpha,
            counts: counts.iter(),
            rest: counts.iter().sum(),
            remaining: 1.0,
            rng,
        }
    }
}

impl<R> Iterator for StickBreakingProcess<'_, R>
where
    R: Rng,
{
    type Item = Result<f64, BetaError>;

    #[allow(clippy::cast_precision_loss)]
    fn next(&mut self) -> Option<Self::Item> {
        let count = *self.counts.next()?;
        self.rest -= count;

        let beta = match Beta::new(1.0 + count as f64, self.alpha + self.rest as f64) {
            Ok(beta) => beta,
            Err(err) => return Some(Err(err)),
        };
        let nu: f64 = beta.draw(self.rng);

        let weight = nu * self.remaining;
        self.remaining *= 1.0 - nu;
        Some(Ok(weight))
    }
}

/// Draw one mixture weight per entry of `counts` from the Dirichlet process
/// posterior with concentration `alpha`.
///
/// The weights are non-negative and sum to at most one; the missing mass
/// belongs to the untruncated tail of the stick.
///
/// # Errors
/// If `alpha` is not a valid beta parameter.
pub fn stick_breaking_weights<R: Rng>(
    counts: &[usize],
    alpha: f64,
    rng: &mut R,
) -> Result<Vec<f64>, BetaError> {
    StickBreakingProcess::new(alpha, counts, rng).collect()
}

#[cfg(test)]
mod tests {
    use proptest::prelude::{Just, prop};
    use proptest::{prop_assert, prop_assume, prop_oneof, proptest};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    #[test]
    fn single_nonzero_weight_is_always_drawn() {
        for seed in 0..64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            assert_eq!(draw_index(&[1.0, 0.0, 0.0], &mut rng), Ok(0));
            assert_eq!(draw_index(&[0.0, 0.0, 2.5], &mut rng), Ok(2));
            assert_eq!(draw_index(&[0.0, 1e-300, 0.0], &mut rng), Ok(1));
        }
    }

    #[test]
    fn degenerate_weights_are_rejected() {
        let mut rng = SmallRng::seed_from_u64(0x1234);
        assert_eq!(
            draw_index(&[0.0, 0.0, 0.0], &mut rng),
            Err(WeightsError::AllZero)
        );
        assert_eq!(draw_index(&[], &mut rng), Err(WeightsError::Empty));
        assert_eq!(
            draw_index(&[0.5, -0.1], &mut rng),
            Err(WeightsError::Negative {
                index: 1,
                value: -0.1
            })
        );
        assert_eq!(
            draw_index(&[f64::NAN, 1.0], &mut rng),
            Err(WeightsError::NotANumber { index: 0 })
        );
        assert_eq!(
            draw_index(&[1.0, f64::INFINITY], &mut rng),
            Err(WeightsError::Infinite { index: 1 })
        );
        assert_eq!(
            draw_index(&[f64::MAX, f64::MAX], &mut rng),
            Err(WeightsError::InvalidSum {
                sum: f64::INFINITY
            })
        );
    }

    #[allow(clippy::cast_precision_loss)]
    #[test]
    fn draw_frequencies_follow_weights() {
        let mut rng = SmallRng::seed_from_u64(0xF00D);
        let weights = [0.5, 1.0, 0.0, 2.5];
        let n = 100_000;

        let mut counts = [0_usize; 4];
        for _ in 0..n {
            counts[draw_index(&weights, &mut rng).unwrap()] += 1;
        }

        assert_eq!(counts[2], 0);
        let freqs: Vec<f64> = counts.iter().map(|&c| c as f64 / n as f64).collect();
        assert::close(&freqs[..], &[0.125, 0.25, 0.0, 0.625][..], 0.01);
    }

    #[test]
    fn max_normalization_keeps_ratios() {
        let p = normalize_by_max(vec![1e-200, 4e-200, 2e-200]).unwrap();
        assert::close(&p[..], &[0.25, 1.0, 0.5][..], 1e-12);

        assert_eq!(
            normalize_by_max(vec![0.0, 0.0]),
            Err(WeightsError::AllZero)
        );
    }

    #[test]
    fn max_normalization_does_not_need_a_finite_sum() {
        let p = normalize_by_max(vec![f64::MAX, f64::MAX / 2.0]).unwrap();
        assert::close(&p[..], &[1.0, 0.5][..], 1e-12);

        assert_eq!(
            normalize_by_max(vec![1.0, f64::NAN]),
            Err(WeightsError::NotANumber { index: 1 })
        );
        assert_eq!(
            normalize_by_max(vec![1.0, -2.0]),
            Err(WeightsError::Negative {
                index: 1,
                value: -2.0
            })
        );
    }

    #[test]
    fn sum_normalization() {
        let p = normalize_by_sum(vec![0.9, 0.1]).unwrap();
        assert::close(&p[..], &[0.9, 0.1][..], 1e-12);

        let p = normalize_by_sum(vec![3.0, 1.0]).unwrap();
        assert::close(&p[..], &[0.75, 0.25][..], 1e-12);
    }

    #[test]
    fn stick_breaking_weights_are_a_sub_probability() {
        let mut rng = SmallRng::seed_from_u64(0xABCD);
        for _ in 0..200 {
            let ws = stick_breaking_weights(&[0, 12, 3, 0, 1], 1.0, &mut rng).unwrap();
            assert_eq!(ws.len(), 5);
            assert!(ws.iter().all(|w| (0.0..=1.0).contains(w)));
            assert!(ws.iter().sum::<f64>() <= 1.0 + 1e-12);
        }
    }

    #[allow(clippy::cast_precision_loss)]
    #[test]
    fn stick_breaking_favours_occupied_components() {
        let mut rng = SmallRng::seed_from_u64(0x5EED);
        let n = 2_000;
        let mut mean = [0.0_f64; 3];
        for _ in 0..n {
            let ws = stick_breaking_weights(&[0, 50, 0], 1.0, &mut rng).unwrap();
            mean.iter_mut().zip(ws).for_each(|(m, w)| *m += w / n as f64);
        }
        assert!(mean[1] > mean[0]);
        assert!(mean[1] > mean[2]);
    }

    #[test]
    fn stick_breaking_rejects_invalid_alpha() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert!(stick_breaking_weights(&[0, 0], -1.0, &mut rng).is_err());
    }

    proptest! {
        #[test]
        fn max_normalization_is_scale_invariant(
            p in prop::collection::vec(0.0_f64..1e3, 1..16),
            scale in 1e-6_f64..1e6,
        ) {
            prop_assume!(p.iter().any(|x| *x > 0.0));
            let a = normalize_by_max(p.clone()).unwrap();
            let b = normalize_by_max(p.iter().map(|x| x * scale).collect()).unwrap();
            for (x, y) in a.iter().zip(b.iter()) {
                prop_assert!((x - y).abs() <= 1e-9);
            }
            prop_assert!(a.iter().all(|x| (0.0..=1.0).contains(x)));
        }

        #[test]
        fn draw_index_never_selects_zero_weight(
            p in prop::collection::vec(prop_oneof![Just(0.0), 0.0_f64..10.0], 1..16),
            seed: u64,
        ) {
            prop_assume!(p.iter().any(|x| *x > 0.0));
            let mut rng = SmallRng::seed_from_u64(seed);
            let k = draw_index(&p, &mut rng).unwrap();
            prop_assert!(k < p.len());
            prop_assert!(p[k] > 0.0);
        }
    }
}
