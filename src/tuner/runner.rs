//! Generational loop.
//!
//! [`TunerRunner`] orchestrates the search:
//! workload → initial population → evaluation → (selection → variation →
//! evaluation)* until the termination detector fires.

use super::config::TunerConfig;
use super::evaluator::Evaluator;
use super::population::initial_population;
use super::poll::PollStrategy;
use super::selection::Tournament;
use super::termination::TerminationDetector;
use super::types::{GenerationStats, Individual, InstanceId};
use super::variation::Variator;
use super::workload::Workload;
use crate::error::{EvaluationError, TunerError};
use crate::service::ExecutionService;
use crate::space::ParameterSpace;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::instrument;

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The mean cost stopped improving `max_hits` times.
    Converged,
    /// The generation cap was reached.
    MaxGenerations,
    /// The cancellation flag was set.
    Cancelled,
}

/// Result of a tuning run.
#[derive(Debug, Clone)]
pub struct TunerResult<C> {
    /// Lowest-cost individual seen in any generation.
    pub best: Individual<C>,

    /// Cost of `best`.
    pub best_cost: f64,

    /// Number of generations evaluated.
    pub generations: usize,

    /// Statistics of the last evaluated generation.
    pub final_stats: GenerationStats,

    /// Statistics of every evaluated generation, in order.
    pub history: Vec<GenerationStats>,

    pub terminated_by: Termination,
}

/// Executes the evolutionary loop.
///
/// # Usage
///
/// ```ignore
/// let config = TunerConfig::default().with_seed(42);
/// let result = TunerRunner::run(&space, &mut service, &instances, &config)?;
/// println!("best: {} ({})", result.best.name, result.best_cost);
/// ```
pub struct TunerRunner;

impl TunerRunner {
    /// Runs a search, polling jobs at the configured interval.
    pub fn run<S, E>(
        space: &S,
        service: &mut E,
        instances: &[InstanceId],
        config: &TunerConfig,
    ) -> Result<TunerResult<S::Config>, TunerError>
    where
        S: ParameterSpace,
        E: ExecutionService<S::Config> + ?Sized,
    {
        Self::run_with(space, service, instances, config, config.poll_strategy(), None)
    }

    /// Runs a search with an explicit poll strategy and an optional
    /// cancellation token.
    ///
    /// If `cancel` is set, the run stops after the generation being
    /// evaluated and reports the best individual found so far. A running
    /// evaluation is not interrupted.
    #[instrument(
        level = "debug",
        skip_all,
        fields(population = config.population_size, instances = instances.len())
    )]
    pub fn run_with<S, E, P>(
        space: &S,
        service: &mut E,
        instances: &[InstanceId],
        config: &TunerConfig,
        poll: P,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<TunerResult<S::Config>, TunerError>
    where
        S: ParameterSpace,
        E: ExecutionService<S::Config> + ?Sized,
        P: PollStrategy,
    {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };

        // 1. Workload and first generation
        let workload = Workload::build(instances, config.workload, &mut rng)?;
        let mut population = initial_population(
            space,
            &*service,
            config.population_size,
            config.seeded,
            config.cost_function,
            &mut rng,
        )?;

        let mut evaluator = Evaluator::new(config.cost_function, config.cpu_time_limit, poll);
        let tournament = Tournament::new(config.tournament_size);
        let variator = Variator {
            crossover: config.crossover,
            mutation: config.mutation,
            offspring: config.offspring,
            crossover_points: config.crossover_points,
            step_factor: config.step_factor,
        };
        let mut detector = TerminationDetector::new(config.max_hits);

        tracing::info!(
            runs = workload.len(),
            racing = workload.is_racing(),
            cost = %config.cost_function.label(),
            "starting search"
        );

        let mut generation = 1;
        evaluator.evaluate(
            service,
            space,
            &mut population,
            workload.prefix(generation),
            generation,
        )?;

        let mut history: Vec<GenerationStats> = Vec::new();
        let mut best: Option<Individual<S::Config>> = None;

        // 2. Evolutionary loop
        let terminated_by = loop {
            let stats = GenerationStats::compute(generation, &population)?;
            history.push(stats);
            update_best(&mut best, &population);

            tracing::info!(
                generation,
                mean = stats.mean_cost,
                best = stats.best_cost,
                global_best = best.as_ref().and_then(|b| b.cost),
                hits = detector.hits(),
                "generation evaluated"
            );

            if detector.observe(stats.mean_cost) {
                break Termination::Converged;
            }
            if config.max_generations.is_some_and(|max| generation >= max) {
                break Termination::MaxGenerations;
            }
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    break Termination::Cancelled;
                }
            }

            let pool = tournament.mating_pool(&population, &mut rng)?;
            population = variator.vary(space, &pool, &stats, &mut rng)?;

            generation += 1;
            evaluator.evaluate(
                service,
                space,
                &mut population,
                workload.prefix(generation),
                generation,
            )?;
        };

        let best = best.ok_or(EvaluationError::EmptyPopulation)?;
        let best_cost = best.cost.ok_or(EvaluationError::Unevaluated { index: 0 })?;
        let final_stats = *history.last().ok_or(EvaluationError::EmptyPopulation)?;

        tracing::info!(
            generations = generation,
            best_cost,
            best = %best.name,
            reason = ?terminated_by,
            "search finished"
        );

        Ok(TunerResult {
            best,
            best_cost,
            generations: generation,
            final_stats,
            history,
            terminated_by,
        })
    }
}

/// Replaces `best` with a copy of the population's best individual if that
/// one is strictly better.
fn update_best<C: Clone>(best: &mut Option<Individual<C>>, population: &[Individual<C>]) {
    let Some(candidate) = population
        .iter()
        .filter(|ind| ind.cost.is_some())
        .min_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap_or(std::cmp::Ordering::Equal))
    else {
        return;
    };

    let improves = match best {
        Some(current) => candidate.cost < current.cost,
        None => true,
    };
    if improves {
        *best = Some(candidate.clone());
    }
}
