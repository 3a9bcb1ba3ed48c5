//! Engine configuration.
//!
//! [`TunerConfig`] selects every policy of the evolutionary loop: operator
//! rate modes, crossover arity, cost function, workload shape, seeding and
//! stopping rules.

use super::cost::CostFunction;
use super::poll::FixedInterval;
use super::variation::{AdaptiveRate, Offspring, RateMode};
use super::workload::WorkloadPolicy;
use crate::error::ConfigError;
use crate::space::CutPoints;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration of the configurator.
///
/// # Defaults
///
/// ```
/// use u_tuner::tuner::TunerConfig;
///
/// let config = TunerConfig::default();
/// assert_eq!(config.population_size, 42);
/// assert_eq!(config.tournament_size, 4);
/// assert_eq!(config.max_hits, 4);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_tuner::tuner::{CostFunction, TunerConfig, WorkloadPolicy};
///
/// let config = TunerConfig::default()
///     .with_population_size(20)
///     .with_crossover_rate(0.8)
///     .with_cost_function(CostFunction::Parx(10.0))
///     .with_workload(WorkloadPolicy::Racing { course_length: 50 })
///     .with_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunerConfig {
    /// Number of individuals per generation.
    pub population_size: usize,

    /// Entrants per tournament (1..=population_size).
    pub tournament_size: usize,

    /// Crossover probability per mating pair.
    pub crossover: RateMode,

    /// Per-parameter mutation probability.
    pub mutation: RateMode,

    /// Children per crossover. [`Offspring::Two`] needs an even population.
    pub offspring: Offspring,

    /// Cut points of each crossover.
    #[serde(default)]
    pub crossover_points: CutPoints,

    /// Standard deviation of a mutation step, relative to the parameter's
    /// domain width.
    pub step_factor: f64,

    /// Non-improving generations tolerated before the search stops.
    pub max_hits: usize,

    pub cost_function: CostFunction,

    pub workload: WorkloadPolicy,

    /// Best-known configurations taken from the registry into the first
    /// generation. 0 disables seeding.
    pub seeded: usize,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// CPU time limit of each solver run, in seconds.
    pub cpu_time_limit: f64,

    /// Hard cap on evaluated generations. `None` relies on convergence alone.
    pub max_generations: Option<usize>,

    /// Delay between job status polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            population_size: 42,
            tournament_size: 4,
            crossover: RateMode::Adaptive(AdaptiveRate::CROSSOVER),
            mutation: RateMode::Adaptive(AdaptiveRate::MUTATION),
            offspring: Offspring::One,
            crossover_points: CutPoints::One,
            step_factor: 0.05,
            max_hits: 4,
            cost_function: CostFunction::Average,
            workload: WorkloadPolicy::Repeats(2),
            seeded: 0,
            seed: None,
            cpu_time_limit: 13.0,
            max_generations: None,
            poll_interval_ms: 3_000,
        }
    }
}

impl TunerConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_crossover(mut self, mode: RateMode) -> Self {
        self.crossover = mode;
        self
    }

    /// Uses a fixed crossover probability.
    pub fn with_crossover_rate(self, rate: f64) -> Self {
        self.with_crossover(RateMode::Fixed(rate.clamp(0.0, 1.0)))
    }

    pub fn with_mutation(mut self, mode: RateMode) -> Self {
        self.mutation = mode;
        self
    }

    /// Uses a fixed per-parameter mutation probability.
    pub fn with_mutation_rate(self, rate: f64) -> Self {
        self.with_mutation(RateMode::Fixed(rate.clamp(0.0, 1.0)))
    }

    pub fn with_offspring(mut self, offspring: Offspring) -> Self {
        self.offspring = offspring;
        self
    }

    pub fn with_crossover_points(mut self, points: CutPoints) -> Self {
        self.crossover_points = points;
        self
    }

    /// Sets the mutation step factor.
    pub fn with_step_factor(mut self, factor: f64) -> Self {
        self.step_factor = factor.max(0.0);
        self
    }

    pub fn with_max_hits(mut self, hits: usize) -> Self {
        self.max_hits = hits;
        self
    }

    pub fn with_cost_function(mut self, cost_function: CostFunction) -> Self {
        self.cost_function = cost_function;
        self
    }

    pub fn with_workload(mut self, workload: WorkloadPolicy) -> Self {
        self.workload = workload;
        self
    }

    /// Seeds the first generation with the `k` best-known configurations.
    pub fn with_seeded(mut self, k: usize) -> Self {
        self.seeded = k;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_cpu_time_limit(mut self, seconds: f64) -> Self {
        self.cpu_time_limit = seconds;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = Some(n);
        self
    }

    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll strategy matching [`poll_interval_ms`](Self::poll_interval_ms).
    pub fn poll_strategy(&self) -> FixedInterval {
        FixedInterval(self.poll_interval())
    }

    /// Preset for a cheap first look: small population, racing workload
    /// and an early stop.
    ///
    /// - Population: 20, Tournament: 3, Max hits: 2
    /// - Racing course of 20 runs, at most 25 generations
    pub fn quick() -> Self {
        Self {
            population_size: 20,
            tournament_size: 3,
            max_hits: 2,
            workload: WorkloadPolicy::Racing { course_length: 20 },
            max_generations: Some(25),
            ..Self::default()
        }
    }

    /// Preset for a careful tuning run: larger population, three runs per
    /// instance, PAR10 scoring and paired two-point crossover.
    ///
    /// - Population: 60, Tournament: 4, Max hits: 6
    /// - PAR10 cost, 3 repeats, two children per two-point crossover
    pub fn thorough() -> Self {
        Self {
            population_size: 60,
            tournament_size: 4,
            max_hits: 6,
            offspring: Offspring::Two,
            crossover_points: CutPoints::Two,
            cost_function: CostFunction::Parx(10.0),
            workload: WorkloadPolicy::Repeats(3),
            ..Self::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let n = self.population_size;
        if n == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.tournament_size == 0 || self.tournament_size > n {
            return Err(ConfigError::TournamentSize {
                tournament_size: self.tournament_size,
                population_size: n,
            });
        }
        if self.offspring == Offspring::Two && n % 2 != 0 {
            return Err(ConfigError::OddPopulation(n));
        }
        if self.max_hits == 0 {
            return Err(ConfigError::ZeroMaxHits);
        }
        if !(self.cpu_time_limit > 0.0) || !self.cpu_time_limit.is_finite() {
            return Err(ConfigError::CpuTimeLimit(self.cpu_time_limit));
        }
        if let CostFunction::Parx(k) = self.cost_function {
            if !(k > 0.0) {
                return Err(ConfigError::PenaltyFactor(k));
            }
        }
        match self.workload {
            WorkloadPolicy::Repeats(0) | WorkloadPolicy::Racing { course_length: 0 } => {
                return Err(ConfigError::EmptyWorkload);
            }
            _ => {}
        }
        validate_rate("crossover", &self.crossover)?;
        validate_rate("mutation", &self.mutation)?;
        if !(self.step_factor >= 0.0) {
            return Err(ConfigError::StepFactor(self.step_factor));
        }
        if self.seeded > n {
            return Err(ConfigError::SeedCount {
                seeded: self.seeded,
                population_size: n,
            });
        }
        if self.max_generations == Some(0) {
            return Err(ConfigError::ZeroMaxGenerations);
        }
        Ok(())
    }
}

fn validate_rate(operator: &'static str, mode: &RateMode) -> Result<(), ConfigError> {
    match *mode {
        RateMode::Fixed(value) if !(0.0..=1.0).contains(&value) => {
            Err(ConfigError::Probability { operator, value })
        }
        RateMode::Adaptive(AdaptiveRate { k_high, k_low }) if !(k_high >= 0.0 && k_low >= 0.0) => {
            Err(ConfigError::AdaptiveConstants {
                operator,
                k_high,
                k_low,
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TunerConfig::default();
        assert_eq!(config.population_size, 42);
        assert_eq!(config.tournament_size, 4);
        assert_eq!(config.crossover, RateMode::Adaptive(AdaptiveRate::CROSSOVER));
        assert_eq!(config.mutation, RateMode::Adaptive(AdaptiveRate::MUTATION));
        assert_eq!(config.offspring, Offspring::One);
        assert_eq!(config.crossover_points, CutPoints::One);
        assert!((config.step_factor - 0.05).abs() < 1e-12);
        assert_eq!(config.max_hits, 4);
        assert_eq!(config.cost_function, CostFunction::Average);
        assert_eq!(config.workload, WorkloadPolicy::Repeats(2));
        assert_eq!(config.seeded, 0);
        assert!(config.seed.is_none());
        assert!((config.cpu_time_limit - 13.0).abs() < 1e-12);
        assert!(config.max_generations.is_none());
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TunerConfig::default()
            .with_population_size(30)
            .with_tournament_size(5)
            .with_crossover_rate(0.8)
            .with_mutation_rate(0.05)
            .with_offspring(Offspring::Two)
            .with_crossover_points(CutPoints::Two)
            .with_step_factor(0.1)
            .with_max_hits(2)
            .with_cost_function(CostFunction::Parx(10.0))
            .with_workload(WorkloadPolicy::Racing { course_length: 40 })
            .with_seeded(5)
            .with_seed(7)
            .with_cpu_time_limit(60.0)
            .with_max_generations(50)
            .with_poll_interval_ms(10);

        assert_eq!(config.population_size, 30);
        assert_eq!(config.tournament_size, 5);
        assert_eq!(config.crossover, RateMode::Fixed(0.8));
        assert_eq!(config.mutation, RateMode::Fixed(0.05));
        assert_eq!(config.offspring, Offspring::Two);
        assert_eq!(config.crossover_points, CutPoints::Two);
        assert_eq!(config.max_hits, 2);
        assert_eq!(config.seeded, 5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.max_generations, Some(50));
        assert_eq!(config.poll_strategy(), FixedInterval(Duration::from_millis(10)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_rates() {
        let config = TunerConfig::default()
            .with_crossover_rate(1.5)
            .with_mutation_rate(-0.5)
            .with_step_factor(-1.0);
        assert_eq!(config.crossover, RateMode::Fixed(1.0));
        assert_eq!(config.mutation, RateMode::Fixed(0.0));
        assert_eq!(config.step_factor, 0.0);
    }

    #[test]
    fn test_validate_population_and_tournament() {
        assert_eq!(
            TunerConfig::default().with_population_size(0).validate(),
            Err(ConfigError::EmptyPopulation)
        );
        assert_eq!(
            TunerConfig::default()
                .with_population_size(3)
                .with_tournament_size(4)
                .validate(),
            Err(ConfigError::TournamentSize {
                tournament_size: 4,
                population_size: 3
            })
        );
        assert!(TunerConfig::default().with_tournament_size(0).validate().is_err());
    }

    #[test]
    fn test_validate_odd_population_with_paired_crossover() {
        let config = TunerConfig::default()
            .with_population_size(41)
            .with_offspring(Offspring::Two);
        assert_eq!(config.validate(), Err(ConfigError::OddPopulation(41)));
        assert!(config.with_offspring(Offspring::One).validate().is_ok());
    }

    #[test]
    fn test_validate_limits_and_costs() {
        assert_eq!(
            TunerConfig::default().with_max_hits(0).validate(),
            Err(ConfigError::ZeroMaxHits)
        );
        assert_eq!(
            TunerConfig::default().with_cpu_time_limit(0.0).validate(),
            Err(ConfigError::CpuTimeLimit(0.0))
        );
        assert!(TunerConfig::default()
            .with_cpu_time_limit(f64::NAN)
            .validate()
            .is_err());
        assert_eq!(
            TunerConfig::default()
                .with_cost_function(CostFunction::Parx(0.0))
                .validate(),
            Err(ConfigError::PenaltyFactor(0.0))
        );
        assert_eq!(
            TunerConfig::default().with_max_generations(0).validate(),
            Err(ConfigError::ZeroMaxGenerations)
        );
    }

    #[test]
    fn test_validate_workload_and_seeding() {
        assert_eq!(
            TunerConfig::default()
                .with_workload(WorkloadPolicy::Repeats(0))
                .validate(),
            Err(ConfigError::EmptyWorkload)
        );
        assert_eq!(
            TunerConfig::default()
                .with_workload(WorkloadPolicy::Racing { course_length: 0 })
                .validate(),
            Err(ConfigError::EmptyWorkload)
        );
        assert_eq!(
            TunerConfig::default().with_seeded(43).validate(),
            Err(ConfigError::SeedCount {
                seeded: 43,
                population_size: 42
            })
        );
    }

    #[test]
    fn test_validate_rate_modes() {
        assert_eq!(
            TunerConfig::default()
                .with_crossover(RateMode::Fixed(1.2))
                .validate(),
            Err(ConfigError::Probability {
                operator: "crossover",
                value: 1.2
            })
        );
        assert_eq!(
            TunerConfig::default()
                .with_mutation(RateMode::Adaptive(AdaptiveRate::new(-0.1, 0.2)))
                .validate(),
            Err(ConfigError::AdaptiveConstants {
                operator: "mutation",
                k_high: -0.1,
                k_low: 0.2
            })
        );
    }

    #[test]
    fn test_presets_are_valid() {
        let quick = TunerConfig::quick();
        assert_eq!(quick.population_size, 20);
        assert_eq!(quick.workload, WorkloadPolicy::Racing { course_length: 20 });
        assert_eq!(quick.max_generations, Some(25));
        assert!(quick.validate().is_ok());

        let thorough = TunerConfig::thorough();
        assert_eq!(thorough.population_size, 60);
        assert_eq!(thorough.offspring, Offspring::Two);
        assert_eq!(thorough.crossover_points, CutPoints::Two);
        assert_eq!(thorough.cost_function, CostFunction::Parx(10.0));
        assert!(thorough.validate().is_ok());
    }

    #[test]
    fn test_preset_chainable() {
        let config = TunerConfig::quick().with_population_size(10).with_seed(42);
        assert_eq!(config.population_size, 10);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_generations, Some(25));
    }

    #[test]
    fn test_serde_round_trip() {
        let config = TunerConfig::thorough().with_seed(9).with_mutation_rate(0.05);
        let json = serde_json::to_string(&config).unwrap();
        let back: TunerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_crossover_points_defaults_to_one() {
        let mut json = serde_json::to_value(TunerConfig::thorough()).unwrap();
        json.as_object_mut().unwrap().remove("crossover_points");
        let back: TunerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.crossover_points, CutPoints::One);
        assert_eq!(back.offspring, Offspring::Two);
    }
}
