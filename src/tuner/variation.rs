//! Crossover and mutation with adaptive probabilities.
//!
//! In adaptive mode the probability of applying an operator depends on how
//! good the affected individuals are relative to the current generation:
//! above-average individuals are disrupted less the closer they are to the
//! best one, below-average individuals get a fixed, higher probability.
//!
//! # References
//!
//! Srinivas & Patnaik (1994), "Adaptive Probabilities of Crossover and
//! Mutation in Genetic Algorithms"

use super::types::{GenerationStats, Individual};
use crate::error::EvaluationError;
use crate::space::{CutPoints, ParameterSpace};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// When every individual has the same cost, `f_max == f_avg` and the
/// adaptive ratio is undefined. The probability then saturates at
/// `k_high`.
pub const UNIFORM_POPULATION_SATURATES: bool = true;

/// Constants of the adaptive probability scheme.
///
/// For an individual (or pair) with fitness `f`:
///
/// - `f >= f_avg`: `p = k_high * (f_max - f) / (f_max - f_avg)`
/// - `f < f_avg`: `p = k_low`
///
/// A zero cost gives infinite fitness. The best individual still gets 0
/// and any other above-average individual is infinitely far from the best,
/// so it gets `k_high`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveRate {
    pub k_high: f64,
    pub k_low: f64,
}

impl AdaptiveRate {
    /// Crossover constants `k1 = k3 = 1.0`.
    pub const CROSSOVER: AdaptiveRate = AdaptiveRate {
        k_high: 1.0,
        k_low: 1.0,
    };

    /// Mutation constants `k2 = k4 = 0.2`.
    pub const MUTATION: AdaptiveRate = AdaptiveRate {
        k_high: 0.2,
        k_low: 0.2,
    };

    pub fn new(k_high: f64, k_low: f64) -> Self {
        Self { k_high, k_low }
    }

    /// Probability for fitness `f` given the generation's average and best
    /// fitness. Always within `[0, max(k_high, k_low)]`.
    pub fn probability(&self, f: f64, f_avg: f64, f_max: f64) -> f64 {
        let upper = self.k_high.max(self.k_low);

        let p = if f_max == f_avg {
            if UNIFORM_POPULATION_SATURATES {
                self.k_high
            } else {
                self.k_low
            }
        } else if f < f_avg {
            self.k_low
        } else if f == f_max {
            0.0
        } else if f_max.is_infinite() {
            self.k_high
        } else {
            self.k_high * (f_max - f) / (f_max - f_avg)
        };

        // only reachable with NaN fitness
        if p.is_nan() {
            return 0.0;
        }
        p.clamp(0.0, upper)
    }
}

/// How an operator's probability is determined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RateMode {
    /// The same probability for every individual.
    Fixed(f64),
    /// Fitness-dependent probability.
    Adaptive(AdaptiveRate),
}

impl RateMode {
    pub fn probability(&self, f: f64, f_avg: f64, f_max: f64) -> f64 {
        match self {
            RateMode::Fixed(p) => *p,
            RateMode::Adaptive(rate) => rate.probability(f, f_avg, f_max),
        }
    }
}

/// Number of children a crossover produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Offspring {
    /// Pairs `(pool[i], pool[(i + 1) % n])` for every `i`, one child each.
    #[default]
    One,
    /// Disjoint pairs `(pool[2j], pool[2j + 1])`, two children each.
    /// Requires an even population.
    Two,
}

/// Produces the next generation from a mating pool.
///
/// Randomness is consumed in a fixed order: every crossover decision (and
/// the draws of the crossovers it triggers) in pair order, then every
/// mutation in child order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Variator {
    pub crossover: RateMode,
    pub mutation: RateMode,
    pub offspring: Offspring,
    pub crossover_points: CutPoints,
    /// Mutation step relative to each parameter's domain.
    pub step_factor: f64,
}

impl Variator {
    /// Recombines and mutates `pool` into a population of the same size.
    ///
    /// `stats` must describe the current generation, from which `pool` was
    /// selected. Children produced by crossover, or changed by mutation,
    /// come back without registry id and cost. Parents that pass through
    /// unchanged keep both.
    #[instrument(level = "debug", skip_all, fields(generation = stats.generation, pool = pool.len()))]
    pub fn vary<S, R>(
        &self,
        space: &S,
        pool: &[Individual<S::Config>],
        stats: &GenerationStats,
        rng: &mut R,
    ) -> Result<Vec<Individual<S::Config>>, EvaluationError>
    where
        S: ParameterSpace,
        R: Rng,
    {
        let n = pool.len();
        if n == 0 {
            return Err(EvaluationError::EmptyPopulation);
        }
        let fitness = pool
            .iter()
            .enumerate()
            .map(|(index, ind)| ind.fitness().ok_or(EvaluationError::Unevaluated { index }))
            .collect::<Result<Vec<f64>, _>>()?;

        let f_avg = 1.0 / stats.mean_cost;
        let f_max = 1.0 / stats.best_cost;

        // (child, fitness of the parent it stands in for)
        let mut children: Vec<(Individual<S::Config>, f64)> = Vec::with_capacity(n);
        let mut crossovers = 0usize;

        match self.offspring {
            Offspring::One => {
                for i in 0..n {
                    let j = (i + 1) % n;
                    let f = fitness[i].max(fitness[j]);
                    let p_c = self.crossover.probability(f, f_avg, f_max);

                    if rng.random_range(0.0..1.0) < p_c {
                        let config = space.crossover(
                            &pool[i].config,
                            &pool[j].config,
                            self.crossover_points,
                            rng,
                        );
                        children.push((Individual::new(config), fitness[i]));
                        crossovers += 1;
                    } else {
                        children.push((pool[i].clone(), fitness[i]));
                    }
                }
            }
            Offspring::Two => {
                for start in (0..n).step_by(2) {
                    let i = start;
                    let Some(j) = (start + 1 < n).then_some(start + 1) else {
                        // odd tail, rejected by config validation
                        children.push((pool[i].clone(), fitness[i]));
                        continue;
                    };

                    let f = fitness[i].max(fitness[j]);
                    let p_c = self.crossover.probability(f, f_avg, f_max);

                    if rng.random_range(0.0..1.0) < p_c {
                        let (a, b) = space.crossover_pair(
                            &pool[i].config,
                            &pool[j].config,
                            self.crossover_points,
                            rng,
                        );
                        children.push((Individual::new(a), fitness[i]));
                        children.push((Individual::new(b), fitness[j]));
                        crossovers += 1;
                    } else {
                        children.push((pool[i].clone(), fitness[i]));
                        children.push((pool[j].clone(), fitness[j]));
                    }
                }
            }
        }

        let mut mutated = 0usize;
        let next = children
            .into_iter()
            .map(|(mut child, proxy)| {
                let f = child.fitness().unwrap_or(proxy);
                let p_m = self.mutation.probability(f, f_avg, f_max);

                let mut config = child.config.clone();
                space.mutate(&mut config, self.step_factor, p_m, rng);
                if config != child.config {
                    child.config = config;
                    child.invalidate();
                    mutated += 1;
                }
                child
            })
            .collect::<Vec<_>>();

        tracing::debug!(crossovers, mutated, "variation done");
        Ok(next)
    }
}
