//! Awaiting dispatched jobs.
//!
//! A [`JobBatch`] is the set of jobs submitted for one generation. Awaiting it
//! polls the execution service until every job reports a terminal status.
//! There is no timeout and no cancellation: a job that never terminates stalls
//! the search. Callers that need bounded waiting must use an execution
//! service that enforces per-job limits itself.

use super::types::{JobHandle, JobOutcome};
use crate::error::ServiceError;
use crate::service::ExecutionService;
use std::collections::HashMap;
use std::time::Duration;
use tracing::instrument;

/// Delay policy between status polls.
pub trait PollStrategy {
    /// Called before poll round `round` (0-based).
    fn pause(&mut self, round: usize);
}

/// Sleeps a fixed interval before every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedInterval(pub Duration);

impl Default for FixedInterval {
    fn default() -> Self {
        FixedInterval(Duration::from_secs(3))
    }
}

impl PollStrategy for FixedInterval {
    fn pause(&mut self, _round: usize) {
        std::thread::sleep(self.0);
    }
}

/// Polls back-to-back. For services that answer synchronously (tests,
/// simulations).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoDelay;

impl PollStrategy for NoDelay {
    fn pause(&mut self, _round: usize) {}
}

impl<P: PollStrategy + ?Sized> PollStrategy for &mut P {
    fn pause(&mut self, round: usize) {
        (**self).pause(round);
    }
}

/// Jobs submitted together, awaited together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobBatch {
    handles: Vec<JobHandle>,
}

impl JobBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, handle: JobHandle) {
        self.handles.push(handle);
    }

    pub fn handles(&self) -> &[JobHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Blocks until every job of the batch is terminal.
    ///
    /// Returns the outcomes in dispatch order. Handles absent from a poll
    /// response count as not yet terminal. An empty batch returns without
    /// polling.
    #[instrument(level = "debug", skip(self, service, strategy), fields(jobs = self.handles.len()))]
    pub fn await_terminal<C, S, P>(
        &self,
        service: &mut S,
        strategy: &mut P,
    ) -> Result<Vec<JobOutcome>, ServiceError>
    where
        S: ExecutionService<C> + ?Sized,
        P: PollStrategy + ?Sized,
    {
        if self.handles.is_empty() {
            return Ok(Vec::new());
        }

        let mut round = 0;
        loop {
            strategy.pause(round);
            let statuses: HashMap<JobHandle, JobOutcome> = service.poll(&self.handles)?;

            let pending = self
                .handles
                .iter()
                .filter(|&h| !statuses.get(h).is_some_and(JobOutcome::is_terminal))
                .count();

            if pending == 0 {
                // every handle is present, checked above
                return Ok(self
                    .handles
                    .iter()
                    .filter_map(|h| statuses.get(h).copied())
                    .collect());
            }

            tracing::debug!(round, pending, "waiting for jobs");
            round += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MemoryService, RunReport};
    use crate::tuner::{InstanceId, WorkloadEntry};

    /// Records the rounds it was asked to pause for.
    #[derive(Default)]
    struct Recorder(Vec<usize>);

    impl PollStrategy for Recorder {
        fn pause(&mut self, round: usize) {
            self.0.push(round);
        }
    }

    fn model(config: &u32, _entry: &WorkloadEntry) -> RunReport {
        RunReport::solved(*config as f64)
    }

    fn entry(seed: u64) -> WorkloadEntry {
        WorkloadEntry {
            instance: InstanceId(1),
            seed,
        }
    }

    #[test]
    fn test_empty_batch_does_not_poll() {
        let mut service = MemoryService::new(model);
        let mut recorder = Recorder::default();

        let outcomes = JobBatch::new()
            .await_terminal(&mut service, &mut recorder)
            .unwrap();
        assert!(outcomes.is_empty());
        assert!(recorder.0.is_empty());
        assert_eq!(service.stats().polls, 0);
    }

    #[test]
    fn test_pauses_before_every_poll() {
        let mut service = MemoryService::new(model).with_latency(2);
        let id = service.register(&4, "four").unwrap();
        let mut batch = JobBatch::new();
        batch.push(service.dispatch(id, &entry(1), 10.0).unwrap());
        batch.push(service.dispatch(id, &entry(2), 10.0).unwrap());
        let mut recorder = Recorder::default();

        let outcomes = batch.await_terminal(&mut service, &mut recorder).unwrap();

        assert_eq!(recorder.0, vec![0, 1, 2]);
        assert_eq!(service.stats().polls, 3);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.is_terminal() && o.result_time == 4.0));
    }

    #[test]
    fn test_fixed_interval_defaults_to_three_seconds() {
        assert_eq!(FixedInterval::default(), FixedInterval(Duration::from_secs(3)));
    }
}
