//! Core data model of the configurator.
//!
//! An [`Individual`] pairs a parameter configuration with its evaluation
//! state: the identifier the execution service assigned when the
//! configuration was registered, and the aggregated cost once all of its
//! runs finished. Costs are runtimes, so lower is better.

use crate::error::EvaluationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegistryId(pub u64);

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a dispatched job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobHandle(pub u64);

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Identifier of a problem instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

/// One evaluation unit: a problem instance and the solver seed to run it with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadEntry {
    pub instance: InstanceId,
    pub seed: u64,
}

/// Status of a job as reported by the execution service.
///
/// Status codes follow the experiment database convention: `-1` is
/// "not started", `0` is "running", `1` is "finished" and codes `>= 2` or
/// `< -1` are terminal error/limit states.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    /// Configuration the job belongs to.
    pub registry_id: RegistryId,
    pub status_code: i32,
    /// Measured solver time in seconds. Meaningless unless successful.
    pub result_time: f64,
    /// Positive result codes denote a correct answer.
    pub result_code: i32,
    pub cpu_time_limit: f64,
}

impl JobOutcome {
    /// Whether the job will not change state anymore.
    pub fn is_terminal(&self) -> bool {
        self.status_code >= 1 || self.status_code < -1
    }

    /// Whether the solver produced a correct result.
    pub fn is_success(&self) -> bool {
        self.result_code > 0
    }
}

/// A candidate configuration and its evaluation state.
///
/// `registry_id == None` means the configuration is not registered yet;
/// `cost == None` means it has not been evaluated yet. Only the evaluator
/// and the variator mutate individuals; snapshots (e.g. the global best)
/// are plain clones.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual<C> {
    pub config: C,
    pub registry_id: Option<RegistryId>,
    pub cost: Option<f64>,
    pub name: String,
}

impl<C> Individual<C> {
    /// Wraps a fresh, unregistered configuration.
    pub fn new(config: C) -> Self {
        Self {
            config,
            registry_id: None,
            cost: None,
            name: String::new(),
        }
    }

    /// Wraps a configuration that is already registered and evaluated.
    pub fn evaluated(config: C, registry_id: RegistryId, cost: f64, name: impl Into<String>) -> Self {
        Self {
            config,
            registry_id: Some(registry_id),
            cost: Some(cost),
            name: name.into(),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.cost.is_some()
    }

    /// Fitness used by the adaptive probabilities: the inverse of the cost.
    ///
    /// A zero cost yields positive infinity.
    pub fn fitness(&self) -> Option<f64> {
        self.cost.map(|c| 1.0 / c)
    }

    /// Forgets registration and cost after the configuration changed.
    pub(crate) fn invalidate(&mut self) {
        self.registry_id = None;
        self.cost = None;
        self.name.clear();
    }
}

/// Cost statistics of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// 1-based generation number.
    pub generation: usize,
    pub mean_cost: f64,
    pub best_cost: f64,
    pub count: usize,
}

impl GenerationStats {
    /// Computes mean and best cost over a fully evaluated population.
    pub fn compute<C>(
        generation: usize,
        population: &[Individual<C>],
    ) -> Result<Self, EvaluationError> {
        if population.is_empty() {
            return Err(EvaluationError::EmptyPopulation);
        }

        let mut sum = 0.0;
        let mut best = f64::INFINITY;
        for (index, ind) in population.iter().enumerate() {
            let cost = ind.cost.ok_or(EvaluationError::Unevaluated { index })?;
            sum += cost;
            if cost < best {
                best = cost;
            }
        }

        Ok(Self {
            generation,
            mean_cost: sum / population.len() as f64,
            best_cost: best,
            count: population.len(),
        })
    }
}
