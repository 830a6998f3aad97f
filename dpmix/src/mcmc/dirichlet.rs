//! Gibbs sampler for a truncated Dirichlet process mixture.
//!
//! Every iteration draws a fresh set of `K` models from the posterior of the
//! previous set, routes each observation to one of them by a multinomial draw
//! over `mixture[k] * pdf_k(x)`, finalizes the models and hands them to the
//! [`DirichletState`], which redraws the mixture weights from the new
//! occupancy.

use std::fmt::Debug;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use super::{Phase, Sample};
use crate::config::ClustererConfig;
use crate::error::{Error, Result, WeightsError};
use crate::models::{Model, ModelDistribution};
use crate::rvs::{draw_index, normalize_by_max};
use crate::state::DirichletState;

pub struct DirichletClusterer<O, D>
where
    D: ModelDistribution<O>,
{
    observations: Vec<O>,
    distribution: D,
    state: DirichletState<O, D::Model>,
    config: ClustererConfig,
    phase: Phase,
    samples: Vec<Sample<D::Model>>,
}

impl<O, D> Debug for DirichletClusterer<O, D>
where
    D: ModelDistribution<O> + Debug,
    D::Model: Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirichletClusterer")
            .field("n_observations", &self.observations.len())
            .field("distribution", &self.distribution)
            .field("state", &self.state)
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("n_samples", &self.samples.len())
            .finish()
    }
}

impl<O, D> DirichletClusterer<O, D>
where
    D: ModelDistribution<O>,
{
    /// Validate `config` and draw the initial models from the prior.
    ///
    /// # Errors
    /// If the configuration is invalid or `distribution` does not return
    /// `config.num_clusters` prior models.
    pub fn new<R: Rng>(
        observations: Vec<O>,
        distribution: D,
        config: &ClustererConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;

        if observations.is_empty() {
            tracing::warn!("clustering an empty set of observations; every sample will be empty");
        }

        let models = distribution.sample_from_prior(config.num_clusters, rng);
        if models.len() != config.num_clusters {
            return Err(Error::ModelCountMismatch {
                expected: config.num_clusters,
                found: models.len(),
                iteration: None,
            });
        }
        let state = DirichletState::new(models, config.alpha0, rng)?;

        Ok(Self {
            observations,
            distribution,
            state,
            config: config.clone(),
            phase: Phase::NotStarted,
            samples: Vec::with_capacity(config.expected_samples()),
        })
    }

    /// Run one iteration.
    ///
    /// Returns the phase after the iteration. Once the configured number of
    /// iterations has run this returns [`Phase::Done`] without doing work.
    ///
    /// # Errors
    /// If an observation cannot be assigned or the model distribution breaks
    /// its contract. The state is left as it was before the failed iteration.
    pub fn step<R: Rng>(&mut self, rng: &mut R) -> Result<Phase> {
        let i = match self.phase {
            Phase::NotStarted => 0,
            Phase::Iterating(i) => i + 1,
            Phase::Done => return Ok(Phase::Done),
        };

        if i >= self.config.num_iterations {
            self.phase = Phase::Done;
        } else {
            self.iterate(i, rng)?;
            self.phase = if i + 1 == self.config.num_iterations {
                Phase::Done
            } else {
                Phase::Iterating(i)
            };
        }

        if self.phase == Phase::Done {
            tracing::info!(
                n_iterations = self.config.num_iterations,
                n_samples = self.samples.len(),
                "clustering complete"
            );
        }
        Ok(self.phase)
    }

    fn iterate<R: Rng>(&mut self, i: usize, rng: &mut R) -> Result<()> {
        let k = self.state.num_clusters();

        let mut new_models = self
            .distribution
            .sample_from_posterior(&self.state.models(), rng);
        if new_models.len() != k {
            return Err(Error::ModelCountMismatch {
                expected: k,
                found: new_models.len(),
                iteration: Some(i),
            });
        }

        for (j, x) in self.observations.iter().enumerate() {
            let p: Vec<f64> = (0..k)
                .map(|c| self.state.adjusted_probability(x, c))
                .collect();

            let p = normalize_by_max(p).map_err(|source| match source {
                WeightsError::AllZero => Error::ZeroLikelihood {
                    iteration: i,
                    observation: j,
                },
                source => Error::Degenerate {
                    iteration: i,
                    observation: j,
                    source,
                },
            })?;

            let c = draw_index(&p, rng).map_err(|source| Error::Degenerate {
                iteration: i,
                observation: j,
                source,
            })?;
            new_models[c].observe(x);
        }

        new_models.iter_mut().for_each(|m| m.compute_parameters());

        let occupancy: Vec<usize> = new_models.iter().map(|m| m.count()).collect();
        let n_active = occupancy.iter().filter(|&&n| n > 0).count();

        let sample = self
            .config
            .captures(i)
            .then(|| Sample::new(i, new_models.clone(), occupancy));

        self.state.update(new_models, rng)?;

        if let Some(sample) = sample {
            tracing::trace!(iteration = i, n_active, "capturing sample");
            self.samples.push(sample);
        }
        tracing::debug!(iteration = i, n_active, "iteration complete");
        Ok(())
    }

    /// Run the remaining iterations and return every recorded sample.
    ///
    /// # Errors
    /// See [`DirichletClusterer::step`].
    pub fn cluster<R: Rng>(&mut self, rng: &mut R) -> Result<&[Sample<D::Model>]> {
        while self.step(rng)? != Phase::Done {}
        Ok(&self.samples)
    }

    /// Samples recorded so far, in iteration order.
    #[must_use]
    pub fn samples(&self) -> &[Sample<D::Model>] {
        &self.samples
    }

    #[must_use]
    pub fn into_samples(self) -> Vec<Sample<D::Model>> {
        self.samples
    }

    #[must_use]
    pub const fn state(&self) -> &DirichletState<O, D::Model> {
        &self.state
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn observations(&self) -> &[O] {
        &self.observations
    }

    #[must_use]
    pub const fn distribution(&self) -> &D {
        &self.distribution
    }

    #[must_use]
    pub const fn config(&self) -> &ClustererConfig {
        &self.config
    }
}

/// Cluster `observations` in one call and return the recorded samples.
///
/// The generator is seeded from `config.seed`, or from OS entropy when no
/// seed is set.
///
/// # Errors
/// See [`DirichletClusterer::new`] and [`DirichletClusterer::step`].
pub fn cluster_points<O, D>(
    observations: Vec<O>,
    distribution: D,
    config: &ClustererConfig,
) -> Result<Vec<Sample<D::Model>>>
where
    D: ModelDistribution<O>,
{
    let mut rng = config
        .seed
        .map_or_else(Xoshiro256Plus::from_os_rng, Xoshiro256Plus::seed_from_u64);

    let mut clusterer = DirichletClusterer::new(observations, distribution, config, &mut rng)?;
    clusterer.cluster(&mut rng)?;
    Ok(clusterer.into_samples())
}
