//! Error types.
//!
//! Each concern has its own enum; [`TunerError`] collects them for the
//! evolutionary loop so callers can propagate everything with `?`.

use crate::tuner::{JobHandle, RegistryId};
use thiserror::Error;

/// Invalid engine configuration, detected before the search starts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("population_size must be at least 1")]
    EmptyPopulation,

    #[error("tournament_size must be between 1 and population_size ({population_size}), got {tournament_size}")]
    TournamentSize {
        tournament_size: usize,
        population_size: usize,
    },

    #[error("two-child recombination requires an even population_size, got {0}")]
    OddPopulation(usize),

    #[error("max_hits must be at least 1")]
    ZeroMaxHits,

    #[error("cpu_time_limit must be positive, got {0}")]
    CpuTimeLimit(f64),

    #[error("PARX penalty factor must be positive, got {0}")]
    PenaltyFactor(f64),

    #[error("workload must contain at least one run per configuration")]
    EmptyWorkload,

    #[error("instance set must not be empty")]
    EmptyInstanceSet,

    #[error("{operator} probability must be between 0.0 and 1.0, got {value}")]
    Probability { operator: &'static str, value: f64 },

    #[error("{operator} adaptive constants must be non-negative, got k_high={k_high}, k_low={k_low}")]
    AdaptiveConstants {
        operator: &'static str,
        k_high: f64,
        k_low: f64,
    },

    #[error("mutation step factor must be non-negative, got {0}")]
    StepFactor(f64),

    #[error("cannot seed {seeded} best-known configurations into a population of {population_size}")]
    SeedCount {
        seeded: usize,
        population_size: usize,
    },

    #[error("max_generations must be at least 1 when set")]
    ZeroMaxGenerations,
}

/// Tournament selection precondition failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("cannot select from an empty population")]
    EmptyPopulation,

    #[error("tournament size {size} is invalid for a population of {population}")]
    InvalidTournamentSize { size: usize, population: usize },

    #[error("individual {index} has no cost")]
    MissingCost { index: usize },
}

/// Failures reported by an execution service implementation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("unknown solver configuration {0}")]
    UnknownConfiguration(RegistryId),

    #[error("unknown job {0}")]
    UnknownJob(JobHandle),

    #[error("execution backend failure: {0}")]
    Backend(String),
}

/// Failures of a parameter space implementation.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("configuration serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration has {found} values, parameter space has {expected}")]
    Dimension { expected: usize, found: usize },

    #[error("value {value} of parameter {name} is outside [{min}, {max}]")]
    OutOfBounds {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Inconsistent evaluation state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("solver configuration {0} has no recorded cost")]
    MissingCost(RegistryId),

    #[error("individual {index} was not evaluated")]
    Unevaluated { index: usize },

    #[error("population is empty")]
    EmptyPopulation,
}

/// Any failure of an optimization run.
#[derive(Debug, Error)]
pub enum TunerError {
    #[error("ConfigError: {0}")]
    Config(#[from] ConfigError),

    #[error("SelectionError: {0}")]
    Selection(#[from] SelectionError),

    #[error("ServiceError: {0}")]
    Service(#[from] ServiceError),

    #[error("SpaceError: {0}")]
    Space(#[from] SpaceError),

    #[error("EvaluationError: {0}")]
    Evaluation(#[from] EvaluationError),
}
