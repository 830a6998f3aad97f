//! Error types for the sampler and its collaborators.

use rv::dist::{BetaError, GaussianError};
use thiserror::Error;

/// Result alias for `dpmix`.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a weight vector cannot be used as a (possibly unnormalized)
/// discrete distribution.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum WeightsError {
    #[error("weight vector is empty")]
    Empty,
    #[error("weight {index} is NaN")]
    NotANumber { index: usize },
    #[error("weight {index} is infinite")]
    Infinite { index: usize },
    #[error("weight {index} is negative ({value})")]
    Negative { index: usize, value: f64 },
    #[error("weights sum to {sum}, which is not a positive finite number")]
    InvalidSum { sum: f64 },
    #[error("every weight is zero")]
    AllZero,
}

/// Errors returned by the clusterer, the state and the emission layer.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration value was rejected before any iteration ran.
    #[error("invalid configuration: `{name}` {message}")]
    InvalidConfig {
        name: &'static str,
        message: String,
    },

    /// Every component assigned zero likelihood to an observation.
    #[error("iteration {iteration}: every component assigns zero likelihood to observation {observation}")]
    ZeroLikelihood { iteration: usize, observation: usize },

    /// The probability vector of an observation could not be sampled from.
    #[error("iteration {iteration}: degenerate probabilities for observation {observation}: {source}")]
    Degenerate {
        iteration: usize,
        observation: usize,
        #[source]
        source: WeightsError,
    },

    /// A model distribution returned the wrong number of models.
    #[error("model distribution returned {found} models, expected {expected}{}", fmt_iteration(.iteration))]
    ModelCountMismatch {
        expected: usize,
        found: usize,
        iteration: Option<usize>,
    },

    /// A weight vector outside of the sampling loop was degenerate.
    #[error(transparent)]
    Weights(#[from] WeightsError),

    #[error("invalid beta distribution: {0}")]
    Beta(#[from] BetaError),

    #[error("invalid gaussian distribution: {0}")]
    Gaussian(#[from] GaussianError),
}

fn fmt_iteration(iteration: &Option<usize>) -> String {
    iteration.map_or_else(String::new, |i| format!(" (iteration {i})"))
}

impl Error {
    pub(crate) fn invalid_config(name: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            name,
            message: message.into(),
        }
    }

    /// The iteration the error is tied to, if any.
    #[must_use]
    pub const fn iteration(&self) -> Option<usize> {
        match self {
            Self::ZeroLikelihood { iteration, .. } | Self::Degenerate { iteration, .. } => {
                Some(*iteration)
            }
            Self::ModelCountMismatch { iteration, .. } => *iteration,
            _ => None,
        }
    }

    /// The index of the offending observation, if any.
    #[must_use]
    pub const fn observation(&self) -> Option<usize> {
        match self {
            Self::ZeroLikelihood { observation, .. } | Self::Degenerate { observation, .. } => {
                Some(*observation)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_is_reported() {
        let err = Error::Degenerate {
            iteration: 3,
            observation: 7,
            source: WeightsError::NotANumber { index: 1 },
        };
        assert_eq!(err.iteration(), Some(3));
        assert_eq!(err.observation(), Some(7));
        assert!(err.to_string().contains("observation 7"));

        let err = Error::ModelCountMismatch {
            expected: 4,
            found: 3,
            iteration: Some(2),
        };
        assert_eq!(err.iteration(), Some(2));
        assert_eq!(err.observation(), None);
        assert_eq!(
            err.to_string(),
            "model distribution returned 3 models, expected 4 (iteration 2)"
        );
    }
}
