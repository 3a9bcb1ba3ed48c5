//! Workload (parcours) construction.
//!
//! The workload is sampled once, before the first generation, from the
//! engine's RNG. Seeds are drawn in repeat-major, instance-minor order:
//! for every repeat, every instance in the order given. This order is part
//! of the reproducibility contract.

use super::types::{InstanceId, WorkloadEntry};
use crate::error::ConfigError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of sampled solver seeds.
pub const MAX_SEED: u64 = 2_147_483_647;

/// Number of generations after which a racing course is fully exposed.
const RACING_STAGES: usize = 10;

/// How many runs each configuration is scored on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkloadPolicy {
    /// Every instance repeated `n` times, each run with its own seed.
    Repeats(usize),

    /// A course of `course_length` runs of which generation `g` uses the
    /// first `min(g * course_length / 10, course_length)`.
    ///
    /// Early generations are cheap to score, later ones thorough.
    Racing { course_length: usize },
}

impl Default for WorkloadPolicy {
    fn default() -> Self {
        WorkloadPolicy::Repeats(1)
    }
}

/// The fixed sequence of evaluation units.
#[derive(Debug, Clone, PartialEq)]
pub struct Workload {
    entries: Vec<WorkloadEntry>,
    racing: bool,
}

impl Workload {
    /// Samples a workload for the given instance set.
    pub fn build<R: Rng>(
        instances: &[InstanceId],
        policy: WorkloadPolicy,
        rng: &mut R,
    ) -> Result<Self, ConfigError> {
        if instances.is_empty() {
            return Err(ConfigError::EmptyInstanceSet);
        }

        match policy {
            WorkloadPolicy::Repeats(repeats) => {
                if repeats == 0 {
                    return Err(ConfigError::EmptyWorkload);
                }
                let mut entries = Vec::with_capacity(repeats * instances.len());
                for _ in 0..repeats {
                    for &instance in instances {
                        entries.push(WorkloadEntry {
                            instance,
                            seed: rng.random_range(0..MAX_SEED),
                        });
                    }
                }
                Ok(Self {
                    entries,
                    racing: false,
                })
            }
            WorkloadPolicy::Racing { course_length } => {
                if course_length == 0 {
                    return Err(ConfigError::EmptyWorkload);
                }
                let entries = (0..course_length)
                    .map(|i| WorkloadEntry {
                        instance: instances[i % instances.len()],
                        seed: rng.random_range(0..MAX_SEED),
                    })
                    .collect();
                Ok(Self {
                    entries,
                    racing: true,
                })
            }
        }
    }

    /// Number of runs a configuration evaluated in `generation` receives.
    pub fn len_for(&self, generation: usize) -> usize {
        let total = self.entries.len();
        if !self.racing {
            return total;
        }
        (generation.saturating_mul(total) / RACING_STAGES).clamp(1, total)
    }

    /// Runs dispatched for a configuration evaluated in `generation` (1-based).
    pub fn prefix(&self, generation: usize) -> &[WorkloadEntry] {
        &self.entries[..self.len_for(generation)]
    }

    /// The complete course.
    pub fn entries(&self) -> &[WorkloadEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_racing(&self) -> bool {
        self.racing
    }
}
