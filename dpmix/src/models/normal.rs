//! Isotropic Gaussian components over real vectors.
//!
//! Each component has a mean vector and a single standard deviation shared by
//! every dimension. Occupied components are refit to the observations they
//! absorbed; empty components are redrawn from the prior.

use nalgebra::DVector;
use rand::Rng;
use rv::dist::Gaussian;
use rv::traits::{HasDensity, Sampleable};

use super::{Model, ModelDistribution};
use crate::error::{Error, Result};

const DEFAULT_MIN_STD_DEV: f64 = 1e-3;
// ln(f64::MAX) rounded down, so exp() of it is finite
const MAX_LN_DENSITY: f64 = 709.78;

#[derive(Clone, Debug, PartialEq)]
pub struct NormalModel {
    mean: DVector<f64>,
    std_dev: f64,
    prior_std_dev: f64,
    min_std_dev: f64,
    // sufficient statistics: count, sum and sum of squares
    s0: usize,
    s1: DVector<f64>,
    s2: DVector<f64>,
}

impl NormalModel {
    fn fresh(mean: DVector<f64>, std_dev: f64, prior_std_dev: f64, min_std_dev: f64) -> Self {
        let dim = mean.len();
        Self {
            mean,
            std_dev,
            prior_std_dev,
            min_std_dev,
            s0: 0,
            s1: DVector::zeros(dim),
            s2: DVector::zeros(dim),
        }
    }

    #[must_use]
    pub const fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[must_use]
    pub const fn std_dev(&self) -> f64 {
        self.std_dev
    }
}

impl Model<DVector<f64>> for NormalModel {
    /// Product of the per-dimension densities.
    ///
    /// Tight components in many dimensions have densities above `f64::MAX`;
    /// the log density is capped so the result stays finite.
    fn pdf(&self, x: &DVector<f64>) -> f64 {
        self.mean
            .iter()
            .zip(x.iter())
            .map(|(mu, xi)| Gaussian::new_unchecked(*mu, self.std_dev).ln_f(xi))
            .sum::<f64>()
            .min(MAX_LN_DENSITY)
            .exp()
    }

    fn observe(&mut self, x: &DVector<f64>) {
        self.s0 += 1;
        self.s1 += x;
        self.s2 += x.component_mul(x);
    }

    #[allow(clippy::cast_precision_loss)]
    fn compute_parameters(&mut self) {
        match self.s0 {
            0 => {}
            1 => {
                self.mean = self.s1.clone();
                self.std_dev = self.prior_std_dev;
            }
            n => {
                let n = n as f64;
                self.mean = &self.s1 / n;

                // average of the per-dimension standard deviations
                let spread = self
                    .s2
                    .iter()
                    .zip(self.s1.iter())
                    .map(|(s2, s1)| s2.mul_add(n, -(s1 * s1)).max(0.0).sqrt() / n)
                    .sum::<f64>()
                    / (self.s1.len() as f64);

                self.std_dev = spread.max(self.min_std_dev);
            }
        }
    }

    fn count(&self) -> usize {
        self.s0
    }
}

/// Prior over [`NormalModel`]s: each mean coordinate is drawn from
/// `N(prior_mean[i], prior_std_dev)` and new components start with
/// `prior_std_dev` as their spread.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalModelDistribution {
    prior_mean: DVector<f64>,
    prior_std_dev: f64,
    min_std_dev: f64,
}

impl NormalModelDistribution {
    /// # Errors
    /// If `prior_mean` is empty or `prior_std_dev` is not a positive finite
    /// number.
    pub fn new(prior_mean: DVector<f64>, prior_std_dev: f64) -> Result<Self> {
        if prior_mean.is_empty() {
            return Err(Error::invalid_config(
                "prior_mean",
                "must have at least one dimension",
            ));
        }
        Gaussian::new(0.0, prior_std_dev)?;

        Ok(Self {
            prior_mean,
            prior_std_dev,
            min_std_dev: DEFAULT_MIN_STD_DEV,
        })
    }

    /// Set the floor applied to fitted standard deviations.
    ///
    /// # Errors
    /// If `min_std_dev` is not a positive finite number.
    pub fn with_min_std_dev(mut self, min_std_dev: f64) -> Result<Self> {
        Gaussian::new(0.0, min_std_dev)?;
        self.min_std_dev = min_std_dev;
        Ok(self)
    }

    #[must_use]
    pub const fn prior_mean(&self) -> &DVector<f64> {
        &self.prior_mean
    }

    #[must_use]
    pub const fn prior_std_dev(&self) -> f64 {
        self.prior_std_dev
    }

    fn with_parameters(&self, mean: DVector<f64>, std_dev: f64) -> NormalModel {
        NormalModel::fresh(mean, std_dev, self.prior_std_dev, self.min_std_dev)
    }

    fn draw_from_prior<R: Rng>(&self, rng: &mut R) -> NormalModel {
        let mean: DVector<f64> = DVector::from_iterator(
            self.prior_mean.len(),
            self.prior_mean
                .iter()
                .map(|mu| Gaussian::new_unchecked(*mu, self.prior_std_dev).draw(rng)),
        );
        self.with_parameters(mean, self.prior_std_dev)
    }
}

impl ModelDistribution<DVector<f64>> for NormalModelDistribution {
    type Model = NormalModel;

    fn sample_from_prior<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<NormalModel> {
        (0..n).map(|_| self.draw_from_prior(rng)).collect()
    }

    fn sample_from_posterior<R: Rng>(
        &self,
        posterior: &[&NormalModel],
        rng: &mut R,
    ) -> Vec<NormalModel> {
        posterior
            .iter()
            .map(|model| {
                if model.count() == 0 {
                    self.draw_from_prior(rng)
                } else {
                    self.with_parameters(model.mean.clone(), model.std_dev)
                }
            })
            .collect()
    }
}
