//! Discrete Particle Swarm Optimization for the TSP.
//!
//! Each particle's position is a tour and its velocity an ordered list of
//! position swaps. Per step, swap sequences toward the personal and global
//! bests are derived, probabilistically merged with the retained part of
//! the old velocity, and applied to the tour. An optional bounded 2-opt
//! pass refines the result.

use crate::engines::{Engine, EngineReport};
use crate::instance::TspInstance;
use crate::tour::{apply_swaps, swap_sequence_toward, Tour};
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// PSO parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PsoConfig {
    /// Swarm size
    pub num_particles: usize,
    /// Generation budget
    pub generations: usize,
    /// Inertia weight (w): probability of keeping an old velocity swap
    pub inertia: f64,
    /// Cognitive weight (c1): pull toward the personal best
    pub cognitive: f64,
    /// Social weight (c2): pull toward the global best
    pub social: f64,
    /// Run a 2-opt pass after each velocity application
    pub use_local_search: bool,
    /// Maximum 2-opt sweeps per refinement
    pub two_opt_passes: usize,
    /// Random seed
    pub seed: u64,
}

impl Default for PsoConfig {
    fn default() -> Self {
        PsoConfig {
            num_particles: 15,
            generations: 250,
            inertia: 0.4,
            cognitive: 2.0,
            social: 2.0,
            use_local_search: true,
            two_opt_passes: 5,
            seed: 42,
        }
    }
}

/// One particle: current tour, personal best and swap-sequence velocity.
struct Particle {
    tour: Tour,
    best: Tour,
    velocity: Vec<(usize, usize)>,
}

/// Discrete PSO engine.
pub struct PsoEngine {
    config: PsoConfig,
    particles: Vec<Particle>,
    best: Tour,
    current_best_cost: f64,
    generation: usize,
    rng: ChaCha8Rng,
    started: Instant,
}

impl PsoEngine {
    pub fn new(config: PsoConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        PsoEngine {
            config,
            particles: Vec::new(),
            best: Tour::new(Vec::new()),
            current_best_cost: f64::INFINITY,
            generation: 0,
            rng,
            started: Instant::now(),
        }
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

/// Bounded first-improvement 2-opt: reverse the segment between two edges
/// whenever that shortens the tour, until a sweep finds nothing or the pass
/// budget runs out.
pub(crate) fn two_opt_refine(tour: &mut Tour, instance: &TspInstance, max_passes: usize) {
    let n = tour.len();
    if n < 4 {
        return;
    }

    for _ in 0..max_passes {
        let mut improved = false;

        for i in 0..n - 2 {
            for j in i + 2..n {
                if i == 0 && j == n - 1 {
                    continue; // would reverse the whole tour
                }
                let a = tour.order[i];
                let b = tour.order[i + 1];
                let c = tour.order[j];
                let d = tour.order[(j + 1) % n];

                let delta = instance.distance(a, c) + instance.distance(b, d)
                    - instance.distance(a, b)
                    - instance.distance(c, d);
                if delta < -1e-9 {
                    tour.order[i + 1..=j].reverse();
                    improved = true;
                }
            }
        }

        if !improved {
            break;
        }
    }

    tour.evaluate(instance);
}

impl Engine for PsoEngine {
    fn name(&self) -> &'static str {
        "PSO"
    }

    fn initialize(&mut self, instance: &TspInstance) {
        let n = instance.num_cities();

        self.particles = (0..self.config.num_particles)
            .map(|_| {
                let mut tour = Tour::random(n, &mut self.rng);
                tour.evaluate(instance);
                let best = tour.clone();
                Particle {
                    tour,
                    best,
                    velocity: Vec::new(),
                }
            })
            .collect();

        let best_particle = self
            .particles
            .iter()
            .min_by_key(|p| OrderedFloat(p.best.cost))
            .unwrap();
        self.best = best_particle.best.clone();
        self.current_best_cost = self.best.cost;
        self.generation = 0;
        self.started = Instant::now();

        log::info!(
            "[PSO] initialized: {} cities, {} particles, initial best {:.2}",
            n,
            self.config.num_particles,
            self.best.cost
        );
    }

    fn step(&mut self, instance: &TspInstance) -> EngineReport {
        let n = instance.num_cities();
        let global_best_order = self.best.order.clone();

        for particle in &mut self.particles {
            let r1 = self.rng.gen::<f64>();
            let r2 = self.rng.gen::<f64>();
            let keep_cognitive = (self.config.cognitive * r1).min(1.0);
            let keep_social = (self.config.social * r2).min(1.0);

            // Inertia: retain part of the old velocity
            let mut velocity: Vec<(usize, usize)> = particle
                .velocity
                .iter()
                .copied()
                .filter(|_| self.rng.gen::<f64>() < self.config.inertia)
                .collect();

            // Cognitive pull toward the personal best
            for swap in swap_sequence_toward(&particle.tour.order, &particle.best.order) {
                if self.rng.gen::<f64>() < keep_cognitive {
                    velocity.push(swap);
                }
            }

            // Social pull toward the global best
            for swap in swap_sequence_toward(&particle.tour.order, &global_best_order) {
                if self.rng.gen::<f64>() < keep_social {
                    velocity.push(swap);
                }
            }

            // Cap velocity length to one swap per city per tick
            velocity.truncate(n);

            apply_swaps(&mut particle.tour.order, &velocity);
            particle.velocity = velocity;
            debug_assert!(particle.tour.is_permutation());
            particle.tour.evaluate(instance);

            if self.config.use_local_search {
                two_opt_refine(&mut particle.tour, instance, self.config.two_opt_passes);
            }

            if particle.tour.cost < particle.best.cost {
                particle.best = particle.tour.clone();
            }
        }

        let best_particle = self
            .particles
            .iter()
            .min_by_key(|p| OrderedFloat(p.tour.cost))
            .unwrap();
        self.current_best_cost = best_particle.tour.cost;
        if best_particle.tour.cost < self.best.cost {
            self.best = best_particle.tour.clone();
        }

        self.generation += 1;
        if self.generation % 100 == 0 {
            log::debug!(
                "[PSO] gen {}  best {:.2}  current {:.2}",
                self.generation,
                self.best.cost,
                self.current_best_cost
            );
        }

        self.make_report()
    }

    fn rescore(&mut self, instance: &TspInstance) {
        for particle in &mut self.particles {
            particle.tour.evaluate(instance);
            particle.best.evaluate(instance);
        }
        self.best.evaluate(instance);
        self.current_best_cost = self
            .particles
            .iter()
            .map(|p| OrderedFloat(p.tour.cost))
            .min()
            .map(|c| c.0)
            .unwrap_or(f64::INFINITY);
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
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_instance() -> TspInstance {
        TspInstance::from_coords(
            "test-8",
            &[
                (0.0, 0.0),
                (10.0, 0.0),
                (20.0, 5.0),
                (18.0, 15.0),
                (10.0, 20.0),
                (0.0, 18.0),
                (-5.0, 10.0),
                (5.0, 8.0),
            ],
            40.0,
            40.0,
        )
        .unwrap()
    }

    #[test]
    fn test_velocity_application_keeps_permutations() {
        let instance = test_instance();
        let mut engine = PsoEngine::new(PsoConfig {
            num_particles: 10,
            generations: 40,
            ..Default::default()
        });
        engine.initialize(&instance);

        for _ in 0..40 {
            engine.step(&instance);
            for particle in &engine.particles {
                assert!(particle.tour.is_permutation());
                assert!(particle.best.is_permutation());
            }
        }
    }

    #[test]
    fn test_two_opt_uncrosses_edges() {
        // Unit square visited in crossing order 0,2,1,3; 2-opt must recover
        // the perimeter tour of length 4
        let instance =
            TspInstance::from_coords("square", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)], 2.0, 2.0).unwrap();
        let mut tour = Tour::new(vec![0, 2, 1, 3]);
        tour.evaluate(&instance);
        assert!(tour.cost > 4.0);

        two_opt_refine(&mut tour, &instance, 10);

        assert!(tour.is_permutation());
        assert!((tour.cost - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_two_opt_never_worsens() {
        let instance = test_instance();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..20 {
            let mut tour = Tour::random(instance.num_cities(), &mut rng);
            let before = tour.evaluate(&instance);
            two_opt_refine(&mut tour, &instance, 3);
            assert!(tour.cost <= before + 1e-9);
            assert!(tour.is_permutation());
        }
    }

    #[test]
    fn test_best_ever_monotone_in_static_mode() {
        let instance = test_instance();
        let mut engine = PsoEngine::new(PsoConfig {
            num_particles: 8,
            generations: 50,
            ..Default::default()
        });
        engine.initialize(&instance);

        let mut previous = engine.report().best_cost_ever;
        for _ in 0..50 {
            let report = engine.step(&instance);
            assert!(report.best_cost_ever <= previous + 1e-9);
            previous = report.best_cost_ever;
        }
    }

    #[test]
    fn test_personal_best_tracks_improvement() {
        let instance = test_instance();
        let mut engine = PsoEngine::new(PsoConfig {
            num_particles: 6,
            generations: 30,
            ..Default::default()
        });
        engine.initialize(&instance);

        for _ in 0..30 {
            engine.step(&instance);
            for particle in &engine.particles {
                assert!(particle.best.cost <= particle.tour.cost + 1e-9);
            }
        }
    }
}
