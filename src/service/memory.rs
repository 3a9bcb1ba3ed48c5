//! In-memory execution service.
//!
//! Keeps the registry and the job table in process and computes job outcomes
//! from a runtime model closure. Jobs can be made to stay pending for a
//! number of polls, and pending jobs can be left out of poll responses, to
//! exercise the evaluator's await loop.

use super::ExecutionService;
use crate::error::ServiceError;
use crate::tuner::{CostFunction, JobHandle, JobOutcome, RegistryId, WorkloadEntry};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::collections::HashMap;

/// Status code of a successfully finished run.
const STATUS_FINISHED: i32 = 1;
/// Status code of a run that hit its CPU time limit.
const STATUS_TIME_LIMIT: i32 = 21;
const STATUS_RUNNING: i32 = 0;
const STATUS_NOT_STARTED: i32 = -1;
const RESULT_SOLVED: i32 = 11;
const RESULT_TIME_LIMIT: i32 = -21;

/// What the runtime model reports for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Solver time in seconds.
    pub time: f64,
    /// Whether the solver produced a correct answer.
    pub solved: bool,
}

impl RunReport {
    pub fn solved(time: f64) -> Self {
        Self { time, solved: true }
    }

    pub fn failed() -> Self {
        Self {
            time: f64::INFINITY,
            solved: false,
        }
    }
}

/// Call counters, for assertions on dispatch behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceStats {
    pub registrations: usize,
    pub dispatches: usize,
    pub polls: usize,
}

#[derive(Debug, Clone)]
struct Entry<C> {
    config: C,
    name: String,
    cost: Option<(f64, CostFunction)>,
}

#[derive(Debug, Clone)]
struct Job {
    registry_id: RegistryId,
    entry: WorkloadEntry,
    cpu_time_limit: f64,
    polls_left: usize,
    outcome: Option<JobOutcome>,
}

/// Registry and simulated cluster held in memory.
///
/// # Usage
///
/// ```ignore
/// let mut service = MemoryService::new(|config: &VectorConfig, _entry| {
///     RunReport::solved(config.values().iter().map(|x| x * x).sum())
/// })
/// .with_latency(2);
/// ```
pub struct MemoryService<C, M> {
    entries: Vec<Entry<C>>,
    jobs: Vec<Job>,
    model: M,
    latency: usize,
    partial_responses: bool,
    stats: ServiceStats,
}

impl<C, M> MemoryService<C, M>
where
    C: Clone + PartialEq + Send + Sync,
    M: Fn(&C, &WorkloadEntry) -> RunReport + Send + Sync,
{
    /// Creates an empty service whose runs are scored by `model`.
    pub fn new(model: M) -> Self {
        Self {
            entries: Vec::new(),
            jobs: Vec::new(),
            model,
            latency: 0,
            partial_responses: false,
            stats: ServiceStats::default(),
        }
    }

    /// Jobs stay non-terminal for the first `polls` polls that include them.
    pub fn with_latency(mut self, polls: usize) -> Self {
        self.latency = polls;
        self
    }

    /// Leaves pending jobs out of poll responses instead of reporting them
    /// as running.
    pub fn with_partial_responses(mut self, partial: bool) -> Self {
        self.partial_responses = partial;
        self
    }

    /// Registers a configuration together with a known cost, as if it had
    /// been evaluated in an earlier experiment.
    pub fn insert_evaluated(
        &mut self,
        config: C,
        name: &str,
        cost: f64,
        cost_function: CostFunction,
    ) -> RegistryId {
        self.entries.push(Entry {
            config,
            name: name.to_string(),
            cost: Some((cost, cost_function)),
        });
        RegistryId(self.entries.len() as u64)
    }

    pub fn stats(&self) -> ServiceStats {
        self.stats
    }

    /// Number of registered configurations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: RegistryId) -> Result<&Entry<C>, ServiceError> {
        (id.0 as usize)
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .ok_or(ServiceError::UnknownConfiguration(id))
    }

    fn job_index(&self, handle: JobHandle) -> Result<usize, ServiceError> {
        (handle.0 as usize)
            .checked_sub(1)
            .filter(|&i| i < self.jobs.len())
            .ok_or(ServiceError::UnknownJob(handle))
    }

    /// Runs the model for a job and turns the report into an outcome.
    fn run(&self, index: usize) -> Result<JobOutcome, ServiceError> {
        let job = &self.jobs[index];
        let entry = self.entry(job.registry_id)?;
        let report = (self.model)(&entry.config, &job.entry);

        let outcome = if report.solved && report.time <= job.cpu_time_limit {
            JobOutcome {
                registry_id: job.registry_id,
                status_code: STATUS_FINISHED,
                result_time: report.time,
                result_code: RESULT_SOLVED,
                cpu_time_limit: job.cpu_time_limit,
            }
        } else {
            JobOutcome {
                registry_id: job.registry_id,
                status_code: STATUS_TIME_LIMIT,
                result_time: job.cpu_time_limit,
                result_code: RESULT_TIME_LIMIT,
                cpu_time_limit: job.cpu_time_limit,
            }
        };
        Ok(outcome)
    }

    fn complete(&mut self, ready: &[usize]) -> Result<(), ServiceError> {
        let this = &*self;

        #[cfg(feature = "parallel")]
        let outcomes: Vec<JobOutcome> = ready
            .par_iter()
            .map(|&i| this.run(i))
            .collect::<Result<_, _>>()?;

        #[cfg(not(feature = "parallel"))]
        let outcomes: Vec<JobOutcome> = ready
            .iter()
            .map(|&i| this.run(i))
            .collect::<Result<_, _>>()?;

        for (&i, outcome) in ready.iter().zip(outcomes) {
            self.jobs[i].outcome = Some(outcome);
        }
        Ok(())
    }
}

impl<C, M> ExecutionService<C> for MemoryService<C, M>
where
    C: Clone + PartialEq + Send + Sync,
    M: Fn(&C, &WorkloadEntry) -> RunReport + Send + Sync,
{
    fn find(&self, config: &C) -> Result<Option<RegistryId>, ServiceError> {
        Ok(self
            .entries
            .iter()
            .position(|e| e.config == *config)
            .map(|i| RegistryId(i as u64 + 1)))
    }

    fn register(&mut self, config: &C, name: &str) -> Result<RegistryId, ServiceError> {
        self.entries.push(Entry {
            config: config.clone(),
            name: name.to_string(),
            cost: None,
        });
        self.stats.registrations += 1;
        Ok(RegistryId(self.entries.len() as u64))
    }

    fn dispatch(
        &mut self,
        id: RegistryId,
        entry: &WorkloadEntry,
        cpu_time_limit: f64,
    ) -> Result<JobHandle, ServiceError> {
        self.entry(id)?;
        self.jobs.push(Job {
            registry_id: id,
            entry: *entry,
            cpu_time_limit,
            polls_left: self.latency,
            outcome: None,
        });
        self.stats.dispatches += 1;
        Ok(JobHandle(self.jobs.len() as u64))
    }

    fn poll(
        &mut self,
        handles: &[JobHandle],
    ) -> Result<HashMap<JobHandle, JobOutcome>, ServiceError> {
        self.stats.polls += 1;

        let mut ready = Vec::new();
        let mut pending = Vec::new();
        for &handle in handles {
            let i = self.job_index(handle)?;
            let job = &mut self.jobs[i];
            if job.polls_left > 0 {
                job.polls_left -= 1;
                pending.push(i);
            } else if job.outcome.is_none() {
                ready.push(i);
            }
        }
        self.complete(&ready)?;

        let mut statuses = HashMap::with_capacity(handles.len());
        for &handle in handles {
            let i = self.job_index(handle)?;
            let job = &self.jobs[i];
            match job.outcome {
                Some(outcome) => {
                    statuses.insert(handle, outcome);
                }
                None if !self.partial_responses => {
                    let status_code = if job.polls_left + 1 == self.latency {
                        STATUS_NOT_STARTED
                    } else {
                        STATUS_RUNNING
                    };
                    statuses.insert(
                        handle,
                        JobOutcome {
                            registry_id: job.registry_id,
                            status_code,
                            result_time: 0.0,
                            result_code: 0,
                            cpu_time_limit: job.cpu_time_limit,
                        },
                    );
                }
                None => {}
            }
        }
        Ok(statuses)
    }

    fn set_cost(
        &mut self,
        id: RegistryId,
        cost: f64,
        cost_function: CostFunction,
    ) -> Result<(), ServiceError> {
        self.entry(id)?;
        self.entries[id.0 as usize - 1].cost = Some((cost, cost_function));
        Ok(())
    }

    fn cost(&self, id: RegistryId) -> Result<Option<f64>, ServiceError> {
        Ok(self.entry(id)?.cost.map(|(cost, _)| cost))
    }

    fn best_configs(
        &self,
        cost_function: CostFunction,
        k: usize,
    ) -> Result<Vec<RegistryId>, ServiceError> {
        let mut scored: Vec<(RegistryId, f64)> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| match e.cost {
                Some((cost, cf)) if cf == cost_function => Some((RegistryId(i as u64 + 1), cost)),
                _ => None,
            })
            .collect();
        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(scored.into_iter().take(k).map(|(id, _)| id).collect())
    }

    fn name(&self, id: RegistryId) -> Result<String, ServiceError> {
        Ok(self.entry(id)?.name.clone())
    }

    fn configuration(&self, id: RegistryId) -> Result<C, ServiceError> {
        Ok(self.entry(id)?.config.clone())
    }
}
