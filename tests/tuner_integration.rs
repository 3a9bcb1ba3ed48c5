//! End-to-end runs of the tuner against the in-memory execution service.

use std::sync::Once;
use u_tuner::error::{ConfigError, TunerError};
use u_tuner::service::{ExecutionService, MemoryService, RunReport};
use u_tuner::space::{CutPoints, Parameter, ParameterSpace, VectorConfig, VectorSpace};
use u_tuner::tuner::{
    CostFunction, InstanceId, NoDelay, Offspring, Termination, TunerConfig, TunerRunner,
    WorkloadEntry, WorkloadPolicy,
};

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Two real parameters and one integer parameter.
fn solver_space() -> VectorSpace {
    VectorSpace::new(vec![
        Parameter::real("restart_factor", 1.0, 3.0),
        Parameter::real("decay", 0.8, 1.0),
        Parameter::integer("luby", 0, 4),
    ])
}

/// Fast near `restart_factor = 1.5, decay = 0.95, luby = 2`, harder instances
/// take longer, and configurations far from the optimum time out.
fn solver_model(config: &VectorConfig, entry: &WorkloadEntry) -> RunReport {
    let v = config.values();
    let distance = (v[0] - 1.5).powi(2) + 10.0 * (v[1] - 0.95).powi(2) + 0.1 * (v[2] - 2.0).powi(2);
    let time = (1.0 + distance) * entry.instance.0 as f64;
    if time > 8.0 {
        RunReport::failed()
    } else {
        RunReport::solved(time)
    }
}

fn instances() -> Vec<InstanceId> {
    (1..=4).map(InstanceId).collect()
}

fn base_config() -> TunerConfig {
    TunerConfig::default()
        .with_population_size(16)
        .with_tournament_size(3)
        .with_cpu_time_limit(10.0)
        .with_poll_interval_ms(0)
        .with_seed(2024)
}

#[test]
fn test_search_improves_on_first_generation() {
    init_tracing();
    let mut service = MemoryService::new(solver_model);
    let config = base_config().with_max_hits(20).with_max_generations(15);

    let result = TunerRunner::run_with(
        &solver_space(),
        &mut service,
        &instances(),
        &config,
        NoDelay,
        None,
    )
    .unwrap();

    assert_eq!(result.history.len(), result.generations);
    let first = result.history[0];
    assert!(result.best_cost <= first.best_cost);
    assert!(result.final_stats.mean_cost < first.mean_cost);
    assert!(solver_space()
        .decode(&solver_space().encode(&result.best.config).unwrap())
        .is_ok());
}

#[test]
fn test_runs_are_reproducible_from_seed() {
    init_tracing();
    let run = |seed: u64| {
        let mut service = MemoryService::new(solver_model).with_latency(1);
        let config = base_config().with_seed(seed).with_max_generations(10);
        let result = TunerRunner::run_with(
            &solver_space(),
            &mut service,
            &instances(),
            &config,
            NoDelay,
            None,
        )
        .unwrap();
        (result.history, result.best.config, service.stats())
    };

    assert_eq!(run(7), run(7));
}

#[test]
fn test_configuration_is_registered_once_per_run() {
    init_tracing();
    let mut service = MemoryService::new(solver_model);
    let config = base_config()
        .with_workload(WorkloadPolicy::Repeats(2))
        .with_max_generations(8);

    TunerRunner::run_with(
        &solver_space(),
        &mut service,
        &instances(),
        &config,
        NoDelay,
        None,
    )
    .unwrap();

    let stats = service.stats();
    // every registration is dispatched on the full workload, nothing else
    assert_eq!(stats.dispatches, stats.registrations * 8);
    assert_eq!(service.len(), stats.registrations);
}

#[test]
fn test_racing_workload_with_paired_crossover() {
    init_tracing();
    let space = solver_space();
    let mut service = MemoryService::new(solver_model)
        .with_latency(2)
        .with_partial_responses(true);
    let config = base_config()
        .with_offspring(Offspring::Two)
        .with_crossover_points(CutPoints::Two)
        .with_cost_function(CostFunction::Parx(10.0))
        .with_workload(WorkloadPolicy::Racing { course_length: 20 })
        .with_max_generations(12);

    let result =
        TunerRunner::run_with(&space, &mut service, &instances(), &config, NoDelay, None).unwrap();

    assert!(result.generations >= 2);
    assert!(result.best_cost > 0.0);
    // PAR10 never charges more than ten times the limit
    assert!(result.history.iter().all(|s| s.best_cost <= 100.0));
}

#[test]
fn test_seeding_from_best_known_configurations() {
    init_tracing();
    let space = solver_space();
    let mut service = MemoryService::new(solver_model);
    let known = VectorConfig::new(vec![1.5, 0.95, 2.0]);
    let id = service.insert_evaluated(known.clone(), "hand tuned", 2.5, CostFunction::Average);

    let config = base_config().with_seeded(1).with_max_generations(3);
    let result =
        TunerRunner::run_with(&space, &mut service, &instances(), &config, NoDelay, None).unwrap();

    // the seeded configuration is optimal for this model
    assert_eq!(result.history[0].best_cost, 2.5);
    assert!(result.best_cost <= 2.5);
    assert_eq!(service.cost(id).unwrap(), Some(2.5));
}

#[test]
fn test_flat_costs_terminate_by_convergence() {
    init_tracing();
    let mut service = MemoryService::new(|_: &VectorConfig, _: &WorkloadEntry| RunReport::solved(3.0));
    let config = base_config().with_max_hits(3);

    let result = TunerRunner::run_with(
        &solver_space(),
        &mut service,
        &instances(),
        &config,
        NoDelay,
        None,
    )
    .unwrap();

    assert_eq!(result.terminated_by, Termination::Converged);
    assert_eq!(result.generations, 4);
}

#[test]
fn test_odd_population_with_paired_crossover_is_rejected() {
    let mut service = MemoryService::new(solver_model);
    let config = base_config()
        .with_population_size(15)
        .with_offspring(Offspring::Two);

    let err = TunerRunner::run_with(
        &solver_space(),
        &mut service,
        &instances(),
        &config,
        NoDelay,
        None,
    )
    .unwrap_err();

    assert!(matches!(err, TunerError::Config(ConfigError::OddPopulation(15))));
    assert!(service.is_empty());
}
