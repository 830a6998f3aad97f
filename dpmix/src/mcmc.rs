pub mod dirichlet;

/// Progress of a sampler run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    /// Iteration `i` has completed and more remain.
    Iterating(usize),
    Done,
}

/// The component models recorded at one iteration.
///
/// Samples are copies; nothing the sampler does afterwards can change them.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<M> {
    iteration: usize,
    models: Box<[M]>,
    occupancy: Box<[usize]>,
}

impl<M> Sample<M> {
    pub(crate) fn new(iteration: usize, models: Vec<M>, occupancy: Vec<usize>) -> Self {
        Self {
            iteration,
            models: models.into_boxed_slice(),
            occupancy: occupancy.into_boxed_slice(),
        }
    }

    /// The iteration this sample was captured at.
    #[must_use]
    pub const fn iteration(&self) -> usize {
        self.iteration
    }

    #[must_use]
    pub fn models(&self) -> &[M] {
        &self.models
    }

    /// Observations routed to each component during the captured iteration.
    #[must_use]
    pub fn occupancy(&self) -> &[usize] {
        &self.occupancy
    }

    /// Number of components that absorbed at least one observation.
    #[must_use]
    pub fn n_active(&self) -> usize {
        self.occupancy.iter().filter(|&&n| n > 0).count()
    }
}
