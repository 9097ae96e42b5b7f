//! Solver configuration: algorithm toggles, problem settings and
//! per-engine parameter sets.
//!
//! Parameter presets are keyed on problem size: small (< 50 cities),
//! medium (50-100) and large (> 100). Presets trade run time for solution
//! quality; any field can be overridden after selection.

use crate::engines::{HgaAcoConfig, PsoConfig, SgaConfig};
use serde::{Deserialize, Serialize};

/// Full configuration for a comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Run the standard GA
    pub enable_sga: bool,
    /// Run the hybrid GA-ACO
    pub enable_hga_aco: bool,
    /// Run the discrete PSO
    pub enable_pso: bool,

    /// Number of cities
    pub num_cities: usize,
    /// Grid width
    pub grid_width: f64,
    /// Grid height
    pub grid_height: f64,
    /// Seed for city generation
    pub city_seed: u64,

    /// Move cities during the run
    pub dynamic: bool,
    /// Seed for city movement
    pub movement_seed: u64,

    /// Standard GA parameters
    pub sga: SgaConfig,
    /// Hybrid GA-ACO parameters
    pub hga: HgaAcoConfig,
    /// PSO parameters
    pub pso: PsoConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self::preset_for(50)
    }
}

impl SolverConfig {
    /// Parameter preset for a problem size, following the small/medium/
    /// large split at 50 and 100 cities.
    pub fn preset_for(num_cities: usize) -> Self {
        let base = SolverConfig {
            enable_sga: true,
            enable_hga_aco: true,
            enable_pso: true,
            num_cities,
            grid_width: 100.0,
            grid_height: 100.0,
            city_seed: 1,
            dynamic: false,
            movement_seed: 1,
            sga: SgaConfig::default(),
            hga: HgaAcoConfig::default(),
            pso: PsoConfig::default(),
        };

        if num_cities < 50 {
            // Small: fast execution, defaults are tuned for this band
            base
        } else if num_cities <= 100 {
            SolverConfig {
                sga: SgaConfig {
                    population_size: 100,
                    generations: 1500,
                    elitism_size: 10,
                    ..base.sga
                },
                hga: HgaAcoConfig {
                    population_size: 100,
                    generations: 500,
                    deposit_count: 5,
                    ..base.hga
                },
                pso: PsoConfig {
                    num_particles: 25,
                    generations: 500,
                    inertia: 0.5,
                    ..base.pso
                },
                ..base
            }
        } else {
            SolverConfig {
                sga: SgaConfig {
                    population_size: 200,
                    generations: 5000,
                    mutation_rate: 0.20,
                    elitism_size: 15,
                    tournament_size: 5,
                    ..base.sga
                },
                hga: HgaAcoConfig {
                    population_size: 200,
                    generations: 1000,
                    crossover_rate: 0.65,
                    mutation_rate: 0.20,
                    elitism_size: 10,
                    tournament_size: 5,
                    alpha: 1.2,
                    beta: 2.5,
                    evaporation_rate: 0.4,
                    initial_pheromone: 0.05,
                    deposit_count: 10,
                    aco_contribution_rate: 0.6,
                    ..base.hga
                },
                pso: PsoConfig {
                    num_particles: 30,
                    generations: 1000,
                    inertia: 0.6,
                    cognitive: 1.8,
                    social: 2.2,
                    ..base.pso
                },
                ..base
            }
        }
    }

    /// Check every parameter before a run. Rates must be probabilities,
    /// sizes positive, evaporation in (0, 1].
    pub fn validate(&self) -> Result<(), String> {
        if !self.enable_sga && !self.enable_hga_aco && !self.enable_pso {
            return Err("no algorithm enabled".to_string());
        }
        if self.num_cities < 2 {
            return Err(format!("need at least 2 cities, got {}", self.num_cities));
        }
        if self.grid_width <= 0.0 || self.grid_height <= 0.0 {
            return Err(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid_width, self.grid_height
            ));
        }

        fn check_rate(name: &str, value: f64) -> Result<(), String> {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be in [0, 1], got {}", name, value));
            }
            Ok(())
        }

        check_rate("sga.crossover_rate", self.sga.crossover_rate)?;
        check_rate("sga.mutation_rate", self.sga.mutation_rate)?;
        check_rate("hga.crossover_rate", self.hga.crossover_rate)?;
        check_rate("hga.mutation_rate", self.hga.mutation_rate)?;
        check_rate("hga.aco_contribution_rate", self.hga.aco_contribution_rate)?;
        check_rate("pso.inertia", self.pso.inertia)?;

        if self.sga.population_size == 0 {
            return Err("sga.population_size must be positive".to_string());
        }
        if self.hga.population_size == 0 {
            return Err("hga.population_size must be positive".to_string());
        }
        if self.pso.num_particles == 0 {
            return Err("pso.num_particles must be positive".to_string());
        }
        if self.sga.tournament_size == 0 || self.hga.tournament_size == 0 {
            return Err("tournament_size must be positive".to_string());
        }

        if self.hga.evaporation_rate <= 0.0 || self.hga.evaporation_rate > 1.0 {
            return Err(format!(
                "hga.evaporation_rate must be in (0, 1], got {}",
                self.hga.evaporation_rate
            ));
        }
        if self.hga.alpha < 0.0 || self.hga.beta < 0.0 {
            return Err("hga.alpha and hga.beta must be non-negative".to_string());
        }
        if self.hga.q <= 0.0 {
            return Err("hga.q must be positive".to_string());
        }
        if self.hga.pheromone_floor <= 0.0 {
            return Err("hga.pheromone_floor must be positive".to_string());
        }
        if self.hga.initial_pheromone < self.hga.pheromone_floor {
            return Err("hga.initial_pheromone must not be below the pheromone floor".to_string());
        }
        if self.pso.cognitive < 0.0 || self.pso.social < 0.0 {
            return Err("pso.cognitive and pso.social must be non-negative".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_scale_with_problem_size() {
        let small = SolverConfig::preset_for(20);
        let medium = SolverConfig::preset_for(75);
        let large = SolverConfig::preset_for(150);

        assert_eq!(small.sga.generations, 750);
        assert_eq!(medium.sga.generations, 1500);
        assert_eq!(large.sga.generations, 5000);

        assert_eq!(small.pso.num_particles, 15);
        assert_eq!(medium.pso.num_particles, 25);
        assert_eq!(large.pso.num_particles, 30);

        assert!(small.validate().is_ok());
        assert!(medium.validate().is_ok());
        assert!(large.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_parameters() {
        let mut config = SolverConfig::preset_for(20);
        config.sga.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::preset_for(20);
        config.hga.evaporation_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::preset_for(20);
        config.pso.num_particles = 0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::preset_for(20);
        config.enable_sga = false;
        config.enable_hga_aco = false;
        config.enable_pso = false;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::preset_for(20);
        config.num_cities = 1;
        assert!(config.validate().is_err());
    }
}
