//! Dynamic TSP solver library.
//!
//! Solves static and dynamic Traveling Salesman instances with three
//! competing metaheuristics over a shared tour/cost representation:
//!
//! - Standard Genetic Algorithm (tournament selection, ordered crossover,
//!   swap mutation, elitism)
//! - Hybrid GA-ACO (GA sub-population coupled with ant tour construction
//!   through a shared pheromone matrix)
//! - Discrete PSO (swap-sequence velocities with optional 2-opt refinement)
//!
//! In dynamic mode city positions drift between random targets during the
//! run; the distance matrix is rebuilt and every engine's stored tours are
//! re-scored each generation tick.
//!
//! # Example
//!
//! ```no_run
//! use dtsp_solver::config::SolverConfig;
//! use dtsp_solver::harness::ComparisonHarness;
//!
//! let config = SolverConfig::preset_for(50);
//! let mut harness = ComparisonHarness::from_config(&config).unwrap();
//! for result in harness.run() {
//!     println!("{}: best cost {:.2} in {:.2}s", result.engine, result.best_cost, result.time);
//! }
//! ```

pub mod config;
pub mod dynamic;
pub mod engines;
pub mod harness;
pub mod instance;
pub mod tour;

pub use config::SolverConfig;
pub use instance::TspInstance;
pub use tour::Tour;
