//! Assigning points to a finalized set of clusters.
//!
//! Each point is scored by every cluster's density and the scores are
//! normalized to sum to one. Depending on the [`EmissionPolicy`] the point is
//! then written to its single most likely cluster or to every cluster that
//! clears a threshold.

use crate::error::{Error, Result};
use crate::models::Model;
use crate::rvs::{normalize_by_max, normalize_by_sum};
use crate::state::Cluster;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EmissionPolicy {
    /// Emit to the highest scoring cluster, whatever its history.
    MostLikely,
    /// Emit to every cluster scoring strictly above the threshold that has
    /// absorbed at least one observation.
    Threshold(f64),
}

impl EmissionPolicy {
    /// # Errors
    /// If a threshold is NaN or lies outside `[0, 1]`.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Threshold(t) if !(0.0..=1.0).contains(t) => Err(Error::invalid_config(
                "threshold",
                format!("must lie in [0, 1], got {t}"),
            )),
            _ => Ok(()),
        }
    }
}

/// Receives `(cluster index, weight, point)` triples.
pub trait EmitSink<O> {
    fn emit(&mut self, cluster: usize, weight: f64, x: &O);
}

/// A point together with the cluster it was emitted to.
#[derive(Clone, Debug, PartialEq)]
pub struct WeightedObservation<O> {
    pub cluster: usize,
    pub weight: f64,
    pub observation: O,
}

impl<O: Clone> EmitSink<O> for Vec<WeightedObservation<O>> {
    fn emit(&mut self, cluster: usize, weight: f64, x: &O) {
        self.push(WeightedObservation {
            cluster,
            weight,
            observation: x.clone(),
        });
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointEmitter {
    policy: EmissionPolicy,
}

impl PointEmitter {
    /// # Errors
    /// If the policy's threshold is NaN or lies outside `[0, 1]`.
    pub fn new(policy: EmissionPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self { policy })
    }

    #[must_use]
    pub const fn policy(&self) -> EmissionPolicy {
        self.policy
    }

    /// Normalized membership probabilities of `x` over `clusters`.
    ///
    /// Densities are rescaled by their maximum first so large finite values
    /// cannot overflow the sum.
    ///
    /// # Errors
    /// If `clusters` is empty, a density is NaN, infinite or negative, or
    /// every density is zero.
    pub fn score<O, M: Model<O>>(clusters: &[Cluster<M>], x: &O) -> Result<Vec<f64>> {
        let p = clusters.iter().map(|c| c.model().pdf(x)).collect();
        Ok(normalize_by_sum(normalize_by_max(p)?)?)
    }

    /// Score `x` and write it to `sink` according to the policy.
    ///
    /// # Errors
    /// See [`PointEmitter::score`].
    pub fn emit<O, M, S>(&self, clusters: &[Cluster<M>], x: &O, sink: &mut S) -> Result<()>
    where
        M: Model<O>,
        S: EmitSink<O>,
    {
        let pi = Self::score(clusters, x)?;

        match self.policy {
            EmissionPolicy::MostLikely => {
                let mut best = 0;
                for (k, p) in pi.iter().enumerate().skip(1) {
                    if *p > pi[best] {
                        best = k;
                    }
                }
                sink.emit(clusters[best].index(), pi[best], x);
            }
            EmissionPolicy::Threshold(threshold) => {
                clusters
                    .iter()
                    .zip(pi)
                    .filter(|(cluster, p)| *p > threshold && cluster.total_count() > 0)
                    .for_each(|(cluster, p)| sink.emit(cluster.index(), p, x));
            }
        }
        Ok(())
    }

    /// Emit every point of `xs`, stopping at the first failure.
    ///
    /// # Errors
    /// See [`PointEmitter::score`].
    pub fn emit_all<O, M, S>(&self, clusters: &[Cluster<M>], xs: &[O], sink: &mut S) -> Result<()>
    where
        M: Model<O>,
        S: EmitSink<O>,
    {
        xs.iter().try_for_each(|x| self.emit(clusters, x, sink))
    }
}
