//! Cost aggregation.
//!
//! A [`CostFunction`] turns the terminal job outcomes of one configuration
//! into a scalar cost. Unsuccessful runs are charged a penalty derived from
//! the job's CPU time limit instead of their measured time.

use super::types::JobOutcome;
use serde::{Deserialize, Serialize};

/// Policy for aggregating runtimes into a cost.
///
/// The cost function doubles as the tag under which costs are stored in the
/// experiment registry, so costs computed under different policies never
/// mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum CostFunction {
    /// Mean runtime; failed runs count as the CPU time limit.
    #[default]
    Average,

    /// Penalized average runtime of order `k`: failed runs count as
    /// `k * cpu_time_limit`. `Parx(10.0)` is the common PAR10.
    Parx(f64),
}

impl CostFunction {
    /// Time charged for a single run.
    pub fn charge(&self, outcome: &JobOutcome) -> f64 {
        if outcome.is_success() {
            return outcome.result_time;
        }
        match self {
            CostFunction::Average => outcome.cpu_time_limit,
            CostFunction::Parx(k) => k * outcome.cpu_time_limit,
        }
    }

    /// Aggregates the outcomes of one configuration.
    ///
    /// The sum is divided by `workload_size`, the number of runs dispatched
    /// per configuration, not by the number of outcomes passed in.
    pub fn aggregate<'a, I>(&self, outcomes: I, workload_size: usize) -> f64
    where
        I: IntoIterator<Item = &'a JobOutcome>,
    {
        let total: f64 = outcomes.into_iter().map(|o| self.charge(o)).sum();
        total / workload_size.max(1) as f64
    }

    /// Short label used in logs and run names.
    pub fn label(&self) -> String {
        match self {
            CostFunction::Average => "average".to_string(),
            CostFunction::Parx(k) => format!("par{k}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuner::RegistryId;

    fn run(time: f64, solved: bool) -> JobOutcome {
        JobOutcome {
            registry_id: RegistryId(1),
            status_code: if solved { 1 } else { 21 },
            result_time: time,
            result_code: if solved { 11 } else { -21 },
            cpu_time_limit: 10.0,
        }
    }

    fn sample() -> Vec<JobOutcome> {
        vec![
            run(2.0, true),
            run(3.0, true),
            run(f64::INFINITY, false),
            run(1.0, true),
        ]
    }

    #[test]
    fn test_average_charges_time_limit_for_failures() {
        let cost = CostFunction::Average.aggregate(&sample(), 4);
        assert!((cost - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_par10_charges_ten_times_limit() {
        let cost = CostFunction::Parx(10.0).aggregate(&sample(), 4);
        assert!((cost - 26.5).abs() < 1e-12);
    }

    #[test]
    fn test_divides_by_workload_size() {
        let outcomes = vec![run(4.0, true), run(2.0, true)];
        let cost = CostFunction::Average.aggregate(&outcomes, 4);
        assert!((cost - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_solved_is_plain_mean_for_every_policy() {
        let outcomes = vec![run(1.0, true), run(5.0, true)];
        assert_eq!(CostFunction::Average.aggregate(&outcomes, 2), 3.0);
        assert_eq!(CostFunction::Parx(10.0).aggregate(&outcomes, 2), 3.0);
    }

    #[test]
    fn test_labels() {
        assert_eq!(CostFunction::Average.label(), "average");
        assert_eq!(CostFunction::Parx(10.0).label(), "par10");
    }
}
