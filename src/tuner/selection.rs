//! Tournament selection.
//!
//! Parents are chosen by tournaments among distinct, uniformly drawn
//! individuals. Costs are runtimes, so the lowest cost wins.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::types::Individual;
use crate::error::SelectionError;
use rand::Rng;

/// Tournament selection without replacement.
///
/// Higher tournament sizes mean stronger selection pressure:
/// - 2-3: light pressure, keeps diversity
/// - 4-5: moderate pressure
/// - larger: fast convergence, risk of premature convergence
///
/// # Examples
///
/// ```
/// use u_tuner::tuner::Tournament;
///
/// let tournament = Tournament::new(3);
/// assert_eq!(tournament.size(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tournament {
    size: usize,
}

impl Tournament {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the index of the tournament winner.
    ///
    /// Draws `size` distinct indices (redrawing duplicates) and returns the
    /// one with the lowest cost; ties go to the earliest draw.
    ///
    /// # Errors
    ///
    /// Fails if the population is empty, if `size` is zero or exceeds the
    /// population size, or if a drawn individual has no cost.
    pub fn select<C, R: Rng>(
        &self,
        population: &[Individual<C>],
        rng: &mut R,
    ) -> Result<usize, SelectionError> {
        let n = population.len();
        if n == 0 {
            return Err(SelectionError::EmptyPopulation);
        }
        if self.size == 0 || self.size > n {
            return Err(SelectionError::InvalidTournamentSize {
                size: self.size,
                population: n,
            });
        }

        let mut drawn: Vec<usize> = Vec::with_capacity(self.size);
        drawn.push(rng.random_range(0..n));
        while drawn.len() < self.size {
            let idx = rng.random_range(0..n);
            if !drawn.contains(&idx) {
                drawn.push(idx);
            }
        }

        let cost_of = |idx: usize| {
            population[idx]
                .cost
                .ok_or(SelectionError::MissingCost { index: idx })
        };
        let mut best_idx = drawn[0];
        let mut best_cost = cost_of(best_idx)?;
        for &idx in &drawn[1..] {
            let cost = cost_of(idx)?;
            if cost < best_cost {
                best_idx = idx;
                best_cost = cost;
            }
        }
        Ok(best_idx)
    }

    /// Builds a mating pool of `population.len()` independent tournament
    /// winners. The same individual may be picked more than once; each
    /// entry is an independent clone.
    pub fn mating_pool<C: Clone, R: Rng>(
        &self,
        population: &[Individual<C>],
        rng: &mut R,
    ) -> Result<Vec<Individual<C>>, SelectionError> {
        (0..population.len())
            .map(|_| self.select(population, rng).map(|i| population[i].clone()))
            .collect()
    }
}
