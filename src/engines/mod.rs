//! Optimization engines and their shared abstraction.
//!
//! All three engines implement [`Engine`]: the harness initializes them
//! against a shared instance, steps them once per generation tick, and in
//! dynamic mode asks them to re-score their stored tours after every city
//! movement. Engine-specific state (populations, pheromone, swarms) stays
//! private to each implementation.

pub mod hga_aco;
pub mod pso;
pub mod sga;

pub use hga_aco::{HgaAcoConfig, HgaAcoEngine};
pub use pso::{PsoConfig, PsoEngine};
pub use sga::{SgaConfig, SgaEngine};

use crate::instance::TspInstance;
use crate::tour::Tour;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-generation output of an engine, consumed by the harness and any
/// external visualization layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineReport {
    /// Engine name
    pub engine: String,
    /// Generations completed so far
    pub generation: usize,
    /// Cost of the best tour found so far. In dynamic mode this is
    /// re-scored against the live distance matrix every tick, so it can
    /// rise right after cities move.
    pub best_cost_ever: f64,
    /// Best cost within the current population/swarm under the current
    /// city positions.
    pub current_best_cost: f64,
    /// City order of the best tour found so far
    pub best_tour: Vec<usize>,
    /// Seconds elapsed since initialization
    pub elapsed: f64,
}

/// Common capability set of all engines.
pub trait Engine {
    /// Engine name for reports and logs.
    fn name(&self) -> &'static str;

    /// Build the initial population/swarm and evaluate it.
    fn initialize(&mut self, instance: &TspInstance);

    /// Advance one generation and report progress.
    fn step(&mut self, instance: &TspInstance) -> EngineReport;

    /// Re-score every stored tour against the instance's current distance
    /// matrix. Called once per tick in dynamic mode, after the cities move
    /// and before any engine steps; no cached cost survives it.
    fn rescore(&mut self, instance: &TspInstance);

    /// Progress report without advancing.
    fn report(&self) -> EngineReport;

    /// Generations completed.
    fn generation(&self) -> usize;

    /// Generation budget for the run.
    fn budget(&self) -> usize;

    /// True once the generation budget is exhausted.
    fn finished(&self) -> bool {
        self.generation() >= self.budget()
    }

    /// Current pheromone matrix, for engines that keep one.
    fn pheromone_snapshot(&self) -> Option<Vec<Vec<f64>>> {
        None
    }
}

/// Tournament selection: sample `k` members uniformly at random and return
/// the index of the lowest-cost one.
pub(crate) fn tournament_select<R: Rng>(population: &[Tour], k: usize, rng: &mut R) -> usize {
    let mut best_idx = rng.gen_range(0..population.len());

    for _ in 1..k {
        let idx = rng.gen_range(0..population.len());
        if population[idx].cost < population[best_idx].cost {
            best_idx = idx;
        }
    }

    best_idx
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_tournament_prefers_lower_cost() {
        let mut population: Vec<Tour> = (0..10)
            .map(|i| {
                let mut t = Tour::new(vec![0, 1, 2]);
                t.cost = (10 - i) as f64;
                t
            })
            .collect();
        // Whole-population tournament always picks the global minimum
        population[9].cost = 0.5;

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let winner = tournament_select(&population, population.len() * 40, &mut rng);
        assert_eq!(winner, 9);
    }
}
