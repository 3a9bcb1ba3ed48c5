//! Initial population.

use super::cost::CostFunction;
use super::types::Individual;
use crate::error::{EvaluationError, TunerError};
use crate::service::ExecutionService;
use crate::space::ParameterSpace;
use rand::Rng;

/// Creates the first generation.
///
/// With `seeded > 0`, the population starts with up to `seeded` of the
/// best configurations the registry knows under `cost_function`, already
/// evaluated. All remaining slots are filled with random configurations.
/// Duplicates are not removed here; the evaluator merges them.
pub fn initial_population<S, E, R>(
    space: &S,
    service: &E,
    size: usize,
    seeded: usize,
    cost_function: CostFunction,
    rng: &mut R,
) -> Result<Vec<Individual<S::Config>>, TunerError>
where
    S: ParameterSpace,
    E: ExecutionService<S::Config> + ?Sized,
    R: Rng,
{
    let mut population = Vec::with_capacity(size);

    if seeded > 0 {
        for id in service
            .best_configs(cost_function, seeded)?
            .into_iter()
            .take(size)
        {
            let config = service.configuration(id)?;
            let cost = service.cost(id)?.ok_or(EvaluationError::MissingCost(id))?;
            let name = service.name(id)?;
            tracing::debug!(%id, cost, %name, "seeding best-known configuration");
            population.push(Individual::evaluated(config, id, cost, name));
        }
    }

    while population.len() < size {
        population.push(Individual::new(space.random_config(rng)));
    }
    Ok(population)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MemoryService, RunReport};
    use crate::space::{Parameter, VectorConfig, VectorSpace};
    use crate::tuner::WorkloadEntry;
    use rand::{rngs::StdRng, SeedableRng};

    fn space() -> VectorSpace {
        VectorSpace::new(vec![Parameter::real("x", 0.0, 1.0)])
    }

    fn model(_config: &VectorConfig, _entry: &WorkloadEntry) -> RunReport {
        RunReport::solved(1.0)
    }

    #[test]
    fn test_unseeded_population_is_random() {
        let service = MemoryService::new(model);
        let mut rng = StdRng::seed_from_u64(42);

        let pop = initial_population(&space(), &service, 5, 0, CostFunction::Average, &mut rng)
            .unwrap();
        assert_eq!(pop.len(), 5);
        assert!(pop.iter().all(|ind| ind.registry_id.is_none() && ind.cost.is_none()));
    }

    #[test]
    fn test_seeding_takes_best_known_first() {
        let mut service = MemoryService::new(model);
        service.insert_evaluated(VectorConfig::new(vec![0.9]), "slow", 8.0, CostFunction::Average);
        let fast = service.insert_evaluated(
            VectorConfig::new(vec![0.1]),
            "fast",
            2.0,
            CostFunction::Average,
        );
        service.insert_evaluated(VectorConfig::new(vec![0.5]), "par", 1.0, CostFunction::Parx(10.0));
        let mut rng = StdRng::seed_from_u64(42);

        let pop = initial_population(&space(), &service, 4, 3, CostFunction::Average, &mut rng)
            .unwrap();

        assert_eq!(pop.len(), 4);
        assert_eq!(pop[0].registry_id, Some(fast));
        assert_eq!(pop[0].cost, Some(2.0));
        assert_eq!(pop[0].name, "fast");
        assert_eq!(pop[1].cost, Some(8.0));
        // only two configurations carry an average cost
        assert!(!pop[2].is_evaluated());
        assert!(!pop[3].is_evaluated());
    }

    #[test]
    fn test_seeding_never_exceeds_population_size() {
        let mut service = MemoryService::new(model);
        for i in 0..5 {
            service.insert_evaluated(
                VectorConfig::new(vec![i as f64 / 10.0]),
                "known",
                i as f64 + 1.0,
                CostFunction::Average,
            );
        }
        let mut rng = StdRng::seed_from_u64(1);

        let pop = initial_population(&space(), &service, 2, 5, CostFunction::Average, &mut rng)
            .unwrap();
        assert_eq!(pop.len(), 2);
        assert!(pop.iter().all(Individual::is_evaluated));
    }
}
