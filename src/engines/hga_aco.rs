//! Hybrid Genetic-Algorithm / Ant-Colony-Optimization engine.
//!
//! Couples a GA sub-population with per-generation ACO tour construction
//! through a shared pheromone matrix. Each generation the colony constructs
//! tours edge by edge with probability proportional to
//! `pheromone^alpha * (1/distance)^beta`; the combined pool's best tours
//! deposit pheromone, the whole matrix evaporates, and the GA sub-population
//! evolves as in the standard GA with the best ant tours injected as
//! immigrants.

use crate::engines::{Engine, EngineReport, SgaConfig, SgaEngine};
use crate::instance::TspInstance;
use crate::tour::Tour;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Inverse-distance fallback for coincident cities.
const MAX_HEURISTIC: f64 = 1e6;

/// HGA-ACO parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HgaAcoConfig {
    /// GA sub-population size
    pub population_size: usize,
    /// Generation budget
    pub generations: usize,
    /// Probability that a parent pair is crossed over
    pub crossover_rate: f64,
    /// Per-position swap mutation probability
    pub mutation_rate: f64,
    /// Number of elites carried into the next generation
    pub elitism_size: usize,
    /// Tournament size for selection
    pub tournament_size: usize,
    /// Pheromone importance (alpha)
    pub alpha: f64,
    /// Inverse-distance importance (beta)
    pub beta: f64,
    /// Evaporation rate (rho), in (0, 1]
    pub evaporation_rate: f64,
    /// Pheromone deposit factor (Q)
    pub q: f64,
    /// Initial pheromone level
    pub initial_pheromone: f64,
    /// Lower clamp keeping construction probabilities positive
    pub pheromone_floor: f64,
    /// Number of combined-pool elites that deposit pheromone; also the
    /// number of ant tours injected into the GA sub-population
    pub deposit_count: usize,
    /// Fraction of the population size constructed by ants each generation
    pub aco_contribution_rate: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for HgaAcoConfig {
    fn default() -> Self {
        HgaAcoConfig {
            population_size: 50,
            generations: 250,
            crossover_rate: 0.7,
            mutation_rate: 0.15,
            elitism_size: 5,
            tournament_size: 3,
            alpha: 1.0,
            beta: 3.0,
            evaporation_rate: 0.3,
            q: 100.0,
            initial_pheromone: 0.1,
            pheromone_floor: 1e-9,
            deposit_count: 3,
            aco_contribution_rate: 0.5,
            seed: 42,
        }
    }
}

/// Hybrid GA-ACO engine.
pub struct HgaAcoEngine {
    config: HgaAcoConfig,
    population: Vec<Tour>,
    pheromone: Vec<Vec<f64>>,
    best: Tour,
    current_best_cost: f64,
    generation: usize,
    rng: ChaCha8Rng,
    started: Instant,
}

impl HgaAcoEngine {
    pub fn new(config: HgaAcoConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        HgaAcoEngine {
            config,
            population: Vec::new(),
            pheromone: Vec::new(),
            best: Tour::new(Vec::new()),
            current_best_cost: f64::INFINITY,
            generation: 0,
            rng,
            started: Instant::now(),
        }
    }

    /// GA parameters for the sub-population, shared with [`SgaEngine::breed`].
    fn ga_config(&self) -> SgaConfig {
        SgaConfig {
            population_size: self.config.population_size,
            generations: self.config.generations,
            crossover_rate: self.config.crossover_rate,
            mutation_rate: self.config.mutation_rate,
            elitism_size: self.config.elitism_size,
            tournament_size: self.config.tournament_size,
            seed: self.config.seed,
        }
    }

    /// Construct one ant tour: start at a random city, then repeatedly pick
    /// the next unvisited city by pheromone/distance roulette.
    fn construct_ant_tour(&mut self, instance: &TspInstance) -> Tour {
        let n = instance.num_cities();
        let mut order = Vec::with_capacity(n);
        let mut visited = vec![false; n];

        let mut current = self.rng.gen_range(0..n);
        order.push(current);
        visited[current] = true;

        let mut weights: Vec<(usize, f64)> = Vec::with_capacity(n);
        while order.len() < n {
            weights.clear();
            for j in 0..n {
                if visited[j] {
                    continue;
                }
                let dist = instance.distance(current, j);
                let eta = if dist > 0.0 { 1.0 / dist } else { MAX_HEURISTIC };
                let tau = self.pheromone[current][j];
                weights.push((j, tau.powf(self.config.alpha) * eta.powf(self.config.beta)));
            }

            let total: f64 = weights.iter().map(|&(_, w)| w).sum();
            let next = if total > 0.0 {
                let mut pick = self.rng.gen::<f64>() * total;
                let mut chosen = weights[weights.len() - 1].0;
                for &(j, w) in &weights {
                    pick -= w;
                    if pick <= 0.0 {
                        chosen = j;
                        break;
                    }
                }
                chosen
            } else {
                // Fully degenerate weights: fall back to uniform choice
                weights[self.rng.gen_range(0..weights.len())].0
            };

            order.push(next);
            visited[next] = true;
            current = next;
        }

        let mut tour = Tour::new(order);
        debug_assert!(tour.is_permutation());
        tour.evaluate(instance);
        tour
    }

    /// Deposit from the elite tours, then evaporate globally, then clamp to
    /// the floor.
    fn update_pheromone(&mut self, elites: &[Tour]) {
        for tour in elites {
            if tour.cost <= 0.0 {
                continue;
            }
            let delta = self.config.q / tour.cost;
            let m = tour.order.len();
            for i in 0..m {
                let from = tour.order[i];
                let to = tour.order[(i + 1) % m];
                self.pheromone[from][to] += delta;
                self.pheromone[to][from] += delta;
            }
        }

        let keep = 1.0 - self.config.evaporation_rate;
        let floor = self.config.pheromone_floor;
        let mut max_level = 0.0f64;
        for row in &mut self.pheromone {
            for value in row.iter_mut() {
                *value = (*value * keep).max(floor);
                max_level = max_level.max(*value);
            }
        }

        if max_level <= floor {
            log::warn!(
                "[HGA-ACO] pheromone fully degenerate at gen {}: construction is uniform-random",
                self.generation
            );
        }
    }

    fn ants_per_generation(&self) -> usize {
        ((self.config.aco_contribution_rate * self.config.population_size as f64).ceil() as usize)
            .max(1)
    }

    fn make_report(&self) -> EngineReport {
        EngineReport {
            engine: self.name().to_string(),
            generation: self.generation,
            best_cost_ever: self.best.cost,
            current_best_cost: self.current_best_cost,
            best_tour: self.best.order.clone(),
            elapsed: self.started.elapsed().as_secs_f64(),
        }
    }
}

impl Engine for HgaAcoEngine {
    fn name(&self) -> &'static str {
        "HGA-ACO"
    }

    fn initialize(&mut self, instance: &TspInstance) {
        let n = instance.num_cities();
        self.pheromone = vec![vec![self.config.initial_pheromone; n]; n];

        self.population = (0..self.config.population_size)
            .map(|_| {
                let mut tour = Tour::random(n, &mut self.rng);
                tour.evaluate(instance);
                tour
            })
            .collect();
        self.population.sort_by_key(|t| OrderedFloat(t.cost));

        self.best = self.population[0].clone();
        self.current_best_cost = self.best.cost;
        self.generation = 0;
        self.started = Instant::now();

        log::info!(
            "[HGA-ACO] initialized: {} cities, population {}, {} ants/gen, initial best {:.2}",
            n,
            self.config.population_size,
            self.ants_per_generation(),
            self.best.cost
        );
    }

    fn step(&mut self, instance: &TspInstance) -> EngineReport {
        // Colony phase: construct and evaluate ant tours
        let num_ants = self.ants_per_generation();
        let mut ants: Vec<Tour> = (0..num_ants)
            .map(|_| self.construct_ant_tour(instance))
            .collect();
        ants.sort_by_key(|t| OrderedFloat(t.cost));

        // Combined pool's top performers deposit pheromone
        let mut pool: Vec<&Tour> = self.population.iter().chain(ants.iter()).collect();
        pool.sort_by_key(|t| OrderedFloat(t.cost));
        let deposit_count = self.config.deposit_count.min(pool.len());
        let elites: Vec<Tour> = pool[..deposit_count].iter().map(|&t| t.clone()).collect();
        self.update_pheromone(&elites);

        // GA phase on the sub-population
        let ga_config = self.ga_config();
        let mut next = SgaEngine::breed(&self.population, &ga_config, instance, &mut self.rng);

        // Immigrants: the best ant tours replace the worst GA individuals
        let immigrants = self.config.deposit_count.min(ants.len()).min(next.len());
        if immigrants > 0 {
            next.truncate(next.len() - immigrants);
            next.extend(ants.drain(..immigrants));
            next.sort_by_key(|t| OrderedFloat(t.cost));
        }
        self.population = next;

        self.current_best_cost = self.population[0].cost;
        if self.population[0].cost < self.best.cost {
            self.best = self.population[0].clone();
        }

        self.generation += 1;
        if self.generation % 100 == 0 {
            log::debug!(
                "[HGA-ACO] gen {}  best {:.2}  current {:.2}",
                self.generation,
                self.best.cost,
                self.current_best_cost
            );
        }

        self.make_report()
    }

    fn rescore(&mut self, instance: &TspInstance) {
        for tour in &mut self.population {
            tour.evaluate(instance);
        }
        self.population.sort_by_key(|t| OrderedFloat(t.cost));
        self.best.evaluate(instance);
        self.current_best_cost = self.population[0].cost;
    }

    fn report(&self) -> EngineReport {
        self.make_report()
    }

    fn generation(&self) -> usize {
        self.generation
    }

    fn budget(&self) -> usize {
        self.config.generations
    }

    fn pheromone_snapshot(&self) -> Option<Vec<Vec<f64>>> {
        Some(self.pheromone.clone())
    }
}
