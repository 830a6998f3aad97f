use std::fmt::Debug;
use std::marker::PhantomData;

use rand::Rng;
use rv::data::DataOrSuffStat;
use rv::traits::{ConjugatePrior, HasDensity, HasSuffStat, Rv, Sampleable, SuffStat};

use super::{Model, ModelDistribution};
use crate::utils::NoPrettyPrint;

/// A drawn component distribution together with the sufficient statistic of
/// the observations routed to it.
#[derive(Clone)]
pub struct ConjugateModel<X, Fx>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X>,
    Fx::Stat: Clone,
{
    component: Fx,
    stat: Fx::Stat,
    _phantom_x: PhantomData<X>,
}

impl<X, Fx> Debug for ConjugateModel<X, Fx>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X> + Debug,
    Fx::Stat: Clone + Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConjugateModel")
            .field("component", &NoPrettyPrint::new(&self.component))
            .field("stat", &NoPrettyPrint::new(&self.stat))
            .finish()
    }
}

impl<X, Fx> ConjugateModel<X, Fx>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X>,
    Fx::Stat: Clone,
{
    pub fn new(component: Fx) -> Self {
        let stat = component.empty_suffstat();
        Self {
            component,
            stat,
            _phantom_x: PhantomData,
        }
    }

    pub const fn component(&self) -> &Fx {
        &self.component
    }

    pub const fn stat(&self) -> &Fx::Stat {
        &self.stat
    }
}

impl<X, Fx> Model<X> for ConjugateModel<X, Fx>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X> + Clone,
    Fx::Stat: Clone,
{
    fn pdf(&self, x: &X) -> f64 {
        self.component.f(x)
    }

    fn observe(&mut self, x: &X) {
        self.stat.observe(x);
    }

    // The component is drawn from the posterior by the distribution, so
    // there is nothing left to fit here.
    fn compute_parameters(&mut self) {}

    fn count(&self) -> usize {
        self.stat.n()
    }
}

/// Model distribution backed by a conjugate prior `Pr` over components `Fx`.
///
/// Posterior draws condition on the sufficient statistic each model absorbed;
/// an empty statistic leaves the prior unchanged.
#[derive(Clone, Debug)]
pub struct ConjugateModelDistribution<X, Fx, Pr> {
    prior: Pr,
    _phantom_x: PhantomData<X>,
    _phantom_fx: PhantomData<Fx>,
}

impl<X, Fx, Pr> ConjugateModelDistribution<X, Fx, Pr>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X>,
    Pr: ConjugatePrior<X, Fx>,
{
    pub const fn new(prior: Pr) -> Self {
        Self {
            prior,
            _phantom_x: PhantomData,
            _phantom_fx: PhantomData,
        }
    }

    pub const fn prior(&self) -> &Pr {
        &self.prior
    }
}

impl<X, Fx, Pr> ModelDistribution<X> for ConjugateModelDistribution<X, Fx, Pr>
where
    X: Clone,
    Fx: Rv<X> + HasSuffStat<X> + Clone,
    Fx::Stat: Clone,
    Pr: ConjugatePrior<X, Fx>,
{
    type Model = ConjugateModel<X, Fx>;

    fn sample_from_prior<R: Rng>(&self, n: usize, rng: &mut R) -> Vec<Self::Model> {
        (0..n)
            .map(|_| {
                let component: Fx = self.prior.draw(rng);
                ConjugateModel::new(component)
            })
            .collect()
    }

    fn sample_from_posterior<R: Rng>(
        &self,
        posterior: &[&Self::Model],
        rng: &mut R,
    ) -> Vec<Self::Model> {
        posterior
            .iter()
            .map(|model| {
                let component: Fx = self
                    .prior
                    .posterior(&DataOrSuffStat::SuffStat(&model.stat))
                    .draw(rng);
                ConjugateModel::new(component)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rv::dist::{Gaussian, NormalGamma};

    use super::*;

    type GaussianDistribution = ConjugateModelDistribution<f64, Gaussian, NormalGamma>;

    fn distribution() -> GaussianDistribution {
        ConjugateModelDistribution::new(NormalGamma::new_unchecked(0.0, 1.0, 1.0, 1.0))
    }

    #[test]
    fn observe_tracks_count_and_pdf_follows_component() {
        let mut model = ConjugateModel::<f64, Gaussian>::new(Gaussian::new_unchecked(1.0, 2.0));
        assert_eq!(model.count(), 0);

        model.observe(&0.5);
        model.observe(&1.5);
        model.compute_parameters();

        assert_eq!(model.count(), 2);
        assert::close(model.pdf(&1.0), Gaussian::new_unchecked(1.0, 2.0).f(&1.0_f64), 1e-12);
    }

    #[test]
    fn prior_draws_are_empty() {
        let mut rng = SmallRng::seed_from_u64(0x1234);
        let models = distribution().sample_from_prior(5, &mut rng);
        assert_eq!(models.len(), 5);
        assert!(models.iter().all(|m| m.count() == 0));
    }

    #[allow(clippy::cast_precision_loss)]
    #[test]
    fn posterior_concentrates_on_observed_data() {
        let mut rng = SmallRng::seed_from_u64(0xF00D);
        let dist = distribution();

        let mut occupied = ConjugateModel::<f64, Gaussian>::new(Gaussian::standard());
        for i in 0..200 {
            occupied.observe(&(10.0 + f64::from(i % 5 - 2) * 0.1));
        }
        let empty = ConjugateModel::<f64, Gaussian>::new(Gaussian::standard());

        let n = 100;
        let mut mean_mu = 0.0;
        for _ in 0..n {
            let next = dist.sample_from_posterior(&[&occupied, &empty], &mut rng);
            assert_eq!(next.len(), 2);
            assert!(next.iter().all(|m| m.count() == 0));
            mean_mu += next[0].component().mu() / n as f64;
        }

        assert::close(mean_mu, 10.0, 0.2);
    }
}
