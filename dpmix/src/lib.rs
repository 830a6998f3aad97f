//! Dirichlet process mixture clustering by Gibbs sampling.
//!
//! A [`DirichletClusterer`] holds a fixed number `K` of candidate components.
//! Each iteration it redraws the component models from their posterior,
//! assigns every observation to a component by a multinomial draw over the
//! mixture-weighted densities, and records the models after a burn-in period
//! and at a thinning interval. A finalized set of clusters can then be used
//! to assign points with a [`PointEmitter`].
//!
//! ```
//! use dpmix::{ClustererConfig, cluster_points};
//! use dpmix::models::normal::NormalModelDistribution;
//! use nalgebra::dvector;
//!
//! let xs = vec![dvector![-1.0], dvector![-1.1], dvector![5.0], dvector![5.2]];
//! let config = ClustererConfig {
//!     num_clusters: 2,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let dist = NormalModelDistribution::new(dvector![0.0], 1.0).unwrap();
//! let samples = cluster_points(xs, dist, &config).unwrap();
//! assert_eq!(samples.len(), 10);
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod mcmc;
pub mod models;
pub mod rvs;
pub mod state;

mod utils;

pub use config::ClustererConfig;
pub use emit::{EmissionPolicy, EmitSink, PointEmitter, WeightedObservation};
pub use error::{Error, Result, WeightsError};
pub use mcmc::dirichlet::{DirichletClusterer, cluster_points};
pub use mcmc::{Phase, Sample};
pub use models::{Model, ModelDistribution};
pub use state::{Cluster, DirichletState};
