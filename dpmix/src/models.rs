use rand::Rng;

/// A mixture component: a density over observations of type `O` together with
/// the sufficient statistics of the observations routed to it in the current
/// iteration.
pub trait Model<O>: Clone {
    /// Density of `x` under the current parameters.
    fn pdf(&self, x: &O) -> f64;

    /// Absorb `x` into the running statistics.
    ///
    /// Accumulation must be commutative; the order in which observations are
    /// routed to a component carries no meaning.
    fn observe(&mut self, x: &O);

    /// Finalize the parameters from the absorbed statistics.
    ///
    /// Called once per iteration, after every observation has been routed
    /// and before the model is captured or queried by the next iteration.
    fn compute_parameters(&mut self);

    /// Number of observations absorbed since this model was created.
    fn count(&self) -> usize;
}

/// Prior over component models and the posterior sampler for it.
pub trait ModelDistribution<O> {
    type Model: Model<O>;

    /// Draw `n` models from the prior.
    fn sample_from_prior<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<Self::Model>;

    /// Draw one new model per entry of `posterior`, conditioned on the
    /// statistics that entry absorbed.
    ///
    /// The result must be index-aligned with `posterior` and have the same
    /// length. A model that absorbed nothing yields a draw from the prior.
    fn sample_from_posterior<R: Rng>(
        &self,
        posterior: &[&Self::Model],
        rng: &mut R,
    ) -> Vec<Self::Model>;
}

pub mod conjugate;
pub mod normal;
