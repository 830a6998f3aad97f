#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::emit::EmissionPolicy;
use crate::error::{Error, Result};

/// Options for a clustering run.
///
/// Iteration `i` is recorded when `i >= burnin` and `(i - burnin) % thin == 0`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case", default))]
#[derive(Clone, Debug, PartialEq)]
pub struct ClustererConfig {
    /// Dirichlet process concentration.
    pub alpha0: f64,
    /// Number of candidate components `K`.
    pub num_clusters: usize,
    pub thin: usize,
    pub burnin: usize,
    pub num_iterations: usize,
    /// Emit each point to its most likely cluster only; otherwise every
    /// cluster scoring above `threshold` receives it.
    pub emit_most_likely: bool,
    pub threshold: f64,
    /// Seed for the generator built by [`crate::cluster_points`]. `None` seeds
    /// from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ClustererConfig {
    fn default() -> Self {
        Self {
            alpha0: 1.0,
            num_clusters: 10,
            thin: 1,
            burnin: 0,
            num_iterations: 10,
            emit_most_likely: true,
            threshold: 0.0,
            seed: None,
        }
    }
}

impl ClustererConfig {
    /// # Errors
    /// If `alpha0` is not a positive finite number, `num_clusters` or `thin`
    /// is zero, or `threshold` lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha0.is_finite() && self.alpha0 > 0.0) {
            return Err(Error::invalid_config(
                "alpha0",
                format!("must be a positive finite number, got {}", self.alpha0),
            ));
        }
        if self.num_clusters == 0 {
            return Err(Error::invalid_config("num_clusters", "must be at least one"));
        }
        if self.thin == 0 {
            return Err(Error::invalid_config("thin", "must be at least one"));
        }
        EmissionPolicy::Threshold(self.threshold).validate()
    }

    #[must_use]
    pub const fn emission_policy(&self) -> EmissionPolicy {
        if self.emit_most_likely {
            EmissionPolicy::MostLikely
        } else {
            EmissionPolicy::Threshold(self.threshold)
        }
    }

    /// Whether iteration `i` is recorded as a sample.
    #[must_use]
    pub const fn captures(&self, i: usize) -> bool {
        i >= self.burnin && self.thin > 0 && (i - self.burnin) % self.thin == 0
    }

    /// Samples recorded by a complete run.
    #[must_use]
    pub const fn expected_samples(&self) -> usize {
        if self.thin == 0 || self.num_iterations <= self.burnin {
            0
        } else {
            (self.num_iterations - self.burnin).div_ceil(self.thin)
        }
    }
}
