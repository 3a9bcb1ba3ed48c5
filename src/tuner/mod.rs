//! Adaptive evolutionary configurator.
//!
//! Searches the parameter space of a solver for the configuration with the
//! lowest runtime. Candidates are scored empirically: each new configuration
//! is registered with an [`ExecutionService`](crate::service::ExecutionService),
//! run on a workload of (instance, seed) pairs, and its runtimes are
//! aggregated into a cost.
//!
//! # Key Types
//!
//! - [`TunerConfig`]: Engine parameters (rate modes, cost function, workload, presets)
//! - [`TunerRunner`]: Executes the generational loop
//! - [`TunerResult`]: Best configuration found and per-generation statistics
//!
//! # Building Blocks
//!
//! - [`Workload`]: Fixed repeats or a racing course that grows per generation
//! - [`Evaluator`]: Deduplicating dispatch, polling and cost aggregation
//! - [`Tournament`]: Tournament selection without replacement
//! - [`Variator`]: Crossover and mutation with fixed or adaptive probabilities
//! - [`TerminationDetector`]: Stops when the mean cost stops improving
//! - [`CostFunction`]: Average runtime or PARX
//!
//! # References
//!
//! - Srinivas & Patnaik (1994), "Adaptive Probabilities of Crossover and
//!   Mutation in Genetic Algorithms"
//! - Ansótegui, Sellmann & Tierney (2009), "A Gender-Based Genetic Algorithm
//!   for the Automatic Configuration of Algorithms"
//! - Hutter et al. (2009), "ParamILS: An Automatic Algorithm Configuration
//!   Framework"

mod config;
mod cost;
mod evaluator;
pub mod poll;
mod population;
mod runner;
mod selection;
mod termination;
mod types;
mod variation;
mod workload;

pub use config::TunerConfig;
pub use cost::CostFunction;
pub use evaluator::{EvaluationReport, Evaluator};
pub use poll::{FixedInterval, JobBatch, NoDelay, PollStrategy};
pub use population::initial_population;
pub use runner::{Termination, TunerResult, TunerRunner};
pub use selection::Tournament;
pub use termination::{TerminationDetector, IMPROVEMENT_FACTOR};
pub use types::{
    GenerationStats, Individual, InstanceId, JobHandle, JobOutcome, RegistryId, WorkloadEntry,
};
pub use variation::{AdaptiveRate, Offspring, RateMode, Variator, UNIFORM_POPULATION_SATURATES};
pub use workload::{Workload, WorkloadPolicy, MAX_SEED};
