//! Population evaluation through the execution service.
//!
//! Evaluating a generation has three phases:
//!
//! 1. **Dispatch**: every individual without a registry id is looked up by
//!    value. Known configurations adopt the existing id; new ones are
//!    registered and get one job per workload entry.
//! 2. **Await**: the jobs are polled until all are terminal.
//! 3. **Aggregate**: outcomes are grouped per configuration, turned into a
//!    cost, stored in the registry and copied onto every individual sharing
//!    the configuration. Individuals that matched a configuration from an
//!    earlier generation read their cost back from the registry.

use super::cost::CostFunction;
use super::poll::{JobBatch, PollStrategy};
use super::types::{Individual, JobOutcome, RegistryId, WorkloadEntry};
use crate::error::{EvaluationError, TunerError};
use crate::service::ExecutionService;
use crate::space::ParameterSpace;
use std::collections::BTreeMap;
use tracing::instrument;

/// Counters of one evaluation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationReport {
    /// Configurations registered and dispatched in this pass.
    pub registered: usize,
    /// Individuals matched to an already registered configuration.
    pub deduplicated: usize,
    pub jobs: usize,
    /// Jobs that ended without a correct result and were penalized.
    pub failed_runs: usize,
}

/// Scores populations by running them on a workload.
#[derive(Debug, Clone)]
pub struct Evaluator<P> {
    pub cost_function: CostFunction,
    /// CPU time limit passed to every job, in seconds.
    pub cpu_time_limit: f64,
    pub poll: P,
}

impl<P: PollStrategy> Evaluator<P> {
    pub fn new(cost_function: CostFunction, cpu_time_limit: f64, poll: P) -> Self {
        Self {
            cost_function,
            cpu_time_limit,
            poll,
        }
    }

    /// Gives every individual of `population` a registry id and a cost.
    ///
    /// `workload` holds the runs dispatched for each new configuration;
    /// `generation` only appears in the names of new registrations.
    #[instrument(
        level = "debug",
        skip(self, service, space, population, workload),
        fields(population = population.len(), runs = workload.len())
    )]
    pub fn evaluate<S, E>(
        &mut self,
        service: &mut E,
        space: &S,
        population: &mut [Individual<S::Config>],
        workload: &[WorkloadEntry],
        generation: usize,
    ) -> Result<EvaluationReport, TunerError>
    where
        S: ParameterSpace,
        E: ExecutionService<S::Config> + ?Sized,
    {
        let mut report = EvaluationReport::default();
        let mut batch = JobBatch::new();
        let mut owners: Vec<RegistryId> = Vec::new();

        for ind in population.iter_mut().filter(|ind| ind.registry_id.is_none()) {
            ind.cost = None;

            if let Some(id) = service.find(&ind.config)? {
                ind.name = service.name(id)?;
                ind.registry_id = Some(id);
                report.deduplicated += 1;
                tracing::debug!(%id, name = %ind.name, "configuration already registered");
                continue;
            }

            let name = format!("Gen {} {}", generation, space.canonical_name(&ind.config));
            let id = service.register(&ind.config, &name)?;
            for entry in workload {
                batch.push(service.dispatch(id, entry, self.cpu_time_limit)?);
                owners.push(id);
            }
            ind.registry_id = Some(id);
            ind.name = name;
            report.registered += 1;
        }
        report.jobs = batch.len();

        let outcomes = batch.await_terminal::<S::Config, E, P>(service, &mut self.poll)?;

        let mut runs: BTreeMap<RegistryId, Vec<JobOutcome>> = BTreeMap::new();
        for (id, outcome) in owners.into_iter().zip(outcomes) {
            if !outcome.is_success() {
                report.failed_runs += 1;
                tracing::warn!(
                    %id,
                    status = outcome.status_code,
                    result = outcome.result_code,
                    "run failed, charging penalty"
                );
            }
            runs.entry(id).or_default().push(outcome);
        }

        let mut fresh: BTreeMap<RegistryId, f64> = BTreeMap::new();
        for (&id, outcomes) in &runs {
            let cost = self.cost_function.aggregate(outcomes, workload.len());
            service.set_cost(id, cost, self.cost_function)?;
            fresh.insert(id, cost);
        }

        for (index, ind) in population.iter_mut().enumerate() {
            let id = ind
                .registry_id
                .ok_or(EvaluationError::Unevaluated { index })?;
            if let Some(&cost) = fresh.get(&id) {
                ind.cost = Some(cost);
            } else if ind.cost.is_none() {
                let cost = service.cost(id)?.ok_or(EvaluationError::MissingCost(id))?;
                ind.cost = Some(cost);
            }
        }

        tracing::debug!(
            registered = report.registered,
            deduplicated = report.deduplicated,
            jobs = report.jobs,
            failed = report.failed_runs,
            "population evaluated"
        );
        Ok(report)
    }
}
