//! Parameter space interface.
//!
//! The configurator treats solver configurations as opaque values. Everything
//! it needs from their representation is behind [`ParameterSpace`]: random
//! sampling, recombination, in-place mutation, a display name and a stable
//! serialized form.
//!
//! # Implementations
//!
//! - [`VectorSpace`]: bounded real and integer parameters with one- or
//!   two-cut-point crossover and Gaussian mutation.

pub mod vector;

pub use vector::{ParamKind, Parameter, VectorConfig, VectorSpace};

use crate::error::SpaceError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of cut points used by crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CutPoints {
    /// Head from one parent, tail from the other.
    #[default]
    One,
    /// A middle segment from the other parent.
    Two,
}

/// Defines the configurations of a solver and the variation operators on them.
///
/// Configurations compare by value: two configurations are equal iff all
/// parameter assignments match. The evaluator relies on this equality to
/// reuse the results of configurations that were already evaluated.
///
/// All randomness comes from the `rng` passed in, so runs are reproducible
/// from the engine seed.
pub trait ParameterSpace {
    /// A complete parameter assignment.
    type Config: Clone + PartialEq + std::fmt::Debug;

    /// Samples a configuration uniformly from the space.
    fn random_config<R: Rng>(&self, rng: &mut R) -> Self::Config;

    /// Recombines two parents into one child using `points` cut points.
    fn crossover<R: Rng>(
        &self,
        a: &Self::Config,
        b: &Self::Config,
        points: CutPoints,
        rng: &mut R,
    ) -> Self::Config;

    /// Recombines two parents into two children.
    ///
    /// The default runs two single-child crossovers with the parents swapped.
    fn crossover_pair<R: Rng>(
        &self,
        a: &Self::Config,
        b: &Self::Config,
        points: CutPoints,
        rng: &mut R,
    ) -> (Self::Config, Self::Config) {
        let first = self.crossover(a, b, points, rng);
        let second = self.crossover(b, a, points, rng);
        (first, second)
    }

    /// Mutates each parameter of `config` with probability `probability`.
    ///
    /// `step_factor` scales the perturbation relative to each parameter's
    /// domain.
    fn mutate<R: Rng>(
        &self,
        config: &mut Self::Config,
        step_factor: f64,
        probability: f64,
        rng: &mut R,
    );

    /// Human-readable form, used in run names.
    fn canonical_name(&self, config: &Self::Config) -> String;

    /// Stable serialized form.
    fn encode(&self, config: &Self::Config) -> Result<String, SpaceError>;

    /// Parses the output of [`encode`](ParameterSpace::encode).
    fn decode(&self, encoded: &str) -> Result<Self::Config, SpaceError>;
}
