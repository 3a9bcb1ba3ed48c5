//! Execution service interface.
//!
//! The configurator never runs solvers itself. It talks to an experiment
//! registry and a job execution substrate through [`ExecutionService`]:
//! configurations are registered once, jobs are dispatched per workload
//! entry, and their outcomes are polled until terminal.
//!
//! # Implementations
//!
//! - [`MemoryService`]: an in-process registry with a simulated runtime
//!   model, used for tests, benchmarks and dry runs.

mod memory;

pub use memory::{MemoryService, RunReport, ServiceStats};

use crate::error::ServiceError;
use crate::tuner::{CostFunction, JobHandle, JobOutcome, RegistryId, WorkloadEntry};
use std::collections::HashMap;

/// Registry and job execution backend for configurations of type `C`.
///
/// Lookups by configuration use value equality of `C`: two configurations
/// are the same solver configuration iff all parameter assignments match.
pub trait ExecutionService<C> {
    /// Returns the id of a registered configuration equal to `config`.
    fn find(&self, config: &C) -> Result<Option<RegistryId>, ServiceError>;

    /// Registers a new configuration under a display name.
    fn register(&mut self, config: &C, name: &str) -> Result<RegistryId, ServiceError>;

    /// Launches one solver run.
    fn dispatch(
        &mut self,
        id: RegistryId,
        entry: &WorkloadEntry,
        cpu_time_limit: f64,
    ) -> Result<JobHandle, ServiceError>;

    /// Current status of the given jobs.
    ///
    /// The response may omit handles whose status is not known yet.
    fn poll(&mut self, handles: &[JobHandle])
        -> Result<HashMap<JobHandle, JobOutcome>, ServiceError>;

    /// Stores the cost of a configuration under a cost function.
    fn set_cost(
        &mut self,
        id: RegistryId,
        cost: f64,
        cost_function: CostFunction,
    ) -> Result<(), ServiceError>;

    /// Last stored cost of a configuration, if any.
    fn cost(&self, id: RegistryId) -> Result<Option<f64>, ServiceError>;

    /// Ids of the `k` lowest-cost configurations under a cost function,
    /// best first.
    fn best_configs(
        &self,
        cost_function: CostFunction,
        k: usize,
    ) -> Result<Vec<RegistryId>, ServiceError>;

    /// Display name of a configuration.
    fn name(&self, id: RegistryId) -> Result<String, ServiceError>;

    /// Parameter values of a registered configuration.
    fn configuration(&self, id: RegistryId) -> Result<C, ServiceError>;
}
