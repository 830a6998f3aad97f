//! Sampler state shared between iterations: the component models, their
//! cumulative occupancy and the current mixture weights.

use std::fmt::Debug;
use std::marker::PhantomData;

use itertools::Itertools;
use rand::Rng;

use crate::error::{Error, Result};
use crate::models::Model;
use crate::rvs::stick_breaking_weights;
use crate::utils::NoPrettyPrint;

/// One mixture component and the number of observations it absorbed over
/// every iteration so far.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster<M> {
    index: usize,
    model: M,
    total_count: usize,
}

impl<M> Cluster<M> {
    #[must_use]
    pub const fn new(index: usize, model: M) -> Self {
        Self {
            index,
            model,
            total_count: 0,
        }
    }

    #[must_use]
    pub const fn with_total_count(mut self, total_count: usize) -> Self {
        self.total_count = total_count;
        self
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn model(&self) -> &M {
        &self.model
    }

    /// Observations absorbed by this component across all iterations.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        self.total_count
    }
}

/// Concentration parameter, the `K` clusters and the mixture weights drawn
/// for the next iteration.
///
/// The number of clusters is fixed at construction and cluster `k` always
/// keeps index `k`. Weights are redrawn whenever the models change, so every
/// observation of an iteration is scored against the same weight vector.
pub struct DirichletState<O, M>
where
    M: Model<O>,
{
    alpha0: f64,
    clusters: Vec<Cluster<M>>,
    mixture: Vec<f64>,
    _phantom_o: PhantomData<fn(&O)>,
}

impl<O, M> Debug for DirichletState<O, M>
where
    M: Model<O> + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirichletState")
            .field("alpha0", &self.alpha0)
            .field("clusters", &self.clusters)
            .field("mixture", &NoPrettyPrint::new(&self.mixture))
            .finish()
    }
}

impl<O, M> Clone for DirichletState<O, M>
where
    M: Model<O>,
{
    fn clone(&self) -> Self {
        Self {
            alpha0: self.alpha0,
            clusters: self.clusters.clone(),
            mixture: self.mixture.clone(),
            _phantom_o: PhantomData,
        }
    }
}

impl<O, M> DirichletState<O, M>
where
    M: Model<O>,
{
    /// Wrap `models` into clusters with no history and draw the initial
    /// mixture weights.
    ///
    /// # Errors
    /// If `models` is empty or `alpha0` is not a positive finite number.
    pub fn new<R: Rng>(models: Vec<M>, alpha0: f64, rng: &mut R) -> Result<Self> {
        if models.is_empty() {
            return Err(Error::invalid_config(
                "num_clusters",
                "must be at least one",
            ));
        }
        if !(alpha0.is_finite() && alpha0 > 0.0) {
            return Err(Error::invalid_config(
                "alpha0",
                format!("must be a positive finite number, got {alpha0}"),
            ));
        }

        let clusters = models
            .into_iter()
            .enumerate()
            .map(|(index, model)| Cluster::new(index, model))
            .collect();

        let mut state = Self {
            alpha0,
            clusters,
            mixture: Vec::new(),
            _phantom_o: PhantomData,
        };
        state.redraw_mixture(rng)?;
        Ok(state)
    }

    fn redraw_mixture<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let counts: Vec<usize> = self.clusters.iter().map(|c| c.model.count()).collect();
        self.mixture = stick_breaking_weights(&counts, self.alpha0, rng)?;
        Ok(())
    }

    /// `mixture[k] * pdf_k(x)`: the unnormalized probability that `x` belongs
    /// to cluster `k`.
    ///
    /// # Panics
    /// If `k >= self.num_clusters()`.
    pub fn adjusted_probability(&self, x: &O, k: usize) -> f64 {
        self.mixture[k] * self.clusters[k].model.pdf(x)
    }

    /// Install the models of a completed iteration.
    ///
    /// Each model's `count()` is added to its cluster's total, then fresh
    /// mixture weights are drawn from the new occupancy.
    ///
    /// # Errors
    /// If `new_models` does not hold exactly one model per cluster, or the
    /// weight draw fails.
    pub fn update<R: Rng>(&mut self, new_models: Vec<M>, rng: &mut R) -> Result<()> {
        if new_models.len() != self.clusters.len() {
            return Err(Error::ModelCountMismatch {
                expected: self.clusters.len(),
                found: new_models.len(),
                iteration: None,
            });
        }

        self.clusters
            .iter_mut()
            .zip_eq(new_models)
            .for_each(|(cluster, model)| {
                cluster.total_count += model.count();
                cluster.model = model;
            });

        self.redraw_mixture(rng)
    }

    #[must_use]
    pub const fn alpha0(&self) -> f64 {
        self.alpha0
    }

    #[must_use]
    pub fn num_clusters(&self) -> usize {
        self.clusters.len()
    }

    #[must_use]
    pub fn clusters(&self) -> &[Cluster<M>] {
        &self.clusters
    }

    #[must_use]
    pub fn models(&self) -> Vec<&M> {
        self.clusters.iter().map(|c| &c.model).collect()
    }

    /// Mixture weights in use for the next iteration.
    #[must_use]
    pub fn mixture(&self) -> &[f64] {
        &self.mixture
    }

    #[must_use]
    pub fn total_counts(&self) -> Vec<usize> {
        self.clusters.iter().map(|c| c.total_count).collect()
    }
}
