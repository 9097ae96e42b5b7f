//! Comparison harness: drives the enabled engines against a shared,
//! possibly moving, TSP instance and collects convergence and timing data.
//!
//! Per tick ordering is fixed: the movement model (if any) advances and the
//! distance matrix is rebuilt, every engine re-scores its stored tours
//! against the new matrix, and only then does each engine take its
//! generation step. All engines within a tick therefore observe the same
//! geometry snapshot.

use crate::config::SolverConfig;
use crate::dynamic::DynamicCities;
use crate::engines::{Engine, EngineReport, HgaAcoEngine, PsoEngine, SgaEngine};
use crate::instance::TspInstance;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fs::File;
use std::path::Path;

/// Best-cost trace entry for one engine at one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceRecord {
    /// Engine name
    pub engine: String,
    /// Generation index
    pub generation: usize,
    /// Best cost found so far (re-scored against live geometry in dynamic mode)
    pub best_cost_ever: f64,
    /// Best cost within the current population/swarm
    pub current_best_cost: f64,
}

/// Outcome of one engine's full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRunResult {
    /// Engine name
    pub engine: String,
    /// Instance name
    pub instance: String,
    /// Final best cost
    pub best_cost: f64,
    /// Final best tour
    pub best_tour: Vec<usize>,
    /// Generations executed
    pub generations: usize,
    /// Wall-clock seconds
    pub time: f64,
    /// Per-generation convergence trace
    pub history: Vec<ConvergenceRecord>,
}

/// Aggregated statistics for one engine over repeated runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Engine name
    pub engine: String,
    /// Number of runs aggregated
    pub runs: usize,
    /// Mean final cost
    pub mean_cost: f64,
    /// Standard deviation of final cost
    pub std_cost: f64,
    /// Best final cost
    pub best_cost: f64,
    /// Worst final cost
    pub worst_cost: f64,
    /// Mean wall-clock seconds
    pub mean_time: f64,
}

/// Summary of a repeated comparison, as written to JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Local timestamp of the aggregation
    pub timestamp: String,
    /// Instance name
    pub instance: String,
    /// Whether cities moved during the runs
    pub dynamic: bool,
    /// Per-engine aggregates
    pub statistics: Vec<AlgorithmStatistics>,
}

/// Drives the enabled engines tick by tick over one shared instance.
pub struct ComparisonHarness {
    instance: TspInstance,
    movement: Option<DynamicCities>,
    engines: Vec<Box<dyn Engine>>,
    histories: Vec<Vec<ConvergenceRecord>>,
}

impl ComparisonHarness {
    /// Build instance, movement model and engines from a validated
    /// configuration, and initialize every engine.
    pub fn from_config(config: &SolverConfig) -> Result<Self, String> {
        config.validate()?;

        let instance = TspInstance::random(
            config.num_cities,
            config.grid_width,
            config.grid_height,
            config.city_seed,
        )?;

        let mut engines: Vec<Box<dyn Engine>> = Vec::new();
        if config.enable_sga {
            engines.push(Box::new(SgaEngine::new(config.sga.clone())));
        }
        if config.enable_hga_aco {
            engines.push(Box::new(HgaAcoEngine::new(config.hga.clone())));
        }
        if config.enable_pso {
            engines.push(Box::new(PsoEngine::new(config.pso.clone())));
        }

        let movement = config
            .dynamic
            .then(|| DynamicCities::new(&instance, config.movement_seed));

        Ok(Self::new(instance, movement, engines))
    }

    /// Assemble a harness from explicit parts and initialize the engines.
    pub fn new(
        instance: TspInstance,
        movement: Option<DynamicCities>,
        mut engines: Vec<Box<dyn Engine>>,
    ) -> Self {
        for engine in &mut engines {
            engine.initialize(&instance);
        }
        let histories = vec![Vec::new(); engines.len()];

        ComparisonHarness {
            instance,
            movement,
            engines,
            histories,
        }
    }

    /// The shared instance in its current state.
    pub fn instance(&self) -> &TspInstance {
        &self.instance
    }

    /// True once every engine has exhausted its generation budget.
    pub fn finished(&self) -> bool {
        self.engines.iter().all(|e| e.finished())
    }

    /// Largest generation budget across the enabled engines.
    pub fn max_budget(&self) -> usize {
        self.engines.iter().map(|e| e.budget()).max().unwrap_or(0)
    }

    /// Advance one generation tick. Returns the per-engine reports for
    /// engines that stepped this tick.
    pub fn tick(&mut self) -> Vec<EngineReport> {
        // Move cities first; every engine must see the same snapshot and no
        // stale cached cost
        if let Some(movement) = &mut self.movement {
            movement.advance(&mut self.instance);
            for engine in &mut self.engines {
                engine.rescore(&self.instance);
            }
        }

        let mut reports = Vec::new();
        for (engine, history) in self.engines.iter_mut().zip(self.histories.iter_mut()) {
            if engine.finished() {
                continue;
            }
            let report = engine.step(&self.instance);
            history.push(ConvergenceRecord {
                engine: report.engine.clone(),
                generation: report.generation,
                best_cost_ever: report.best_cost_ever,
                current_best_cost: report.current_best_cost,
            });
            reports.push(report);
        }

        reports
    }

    /// Pheromone matrix of the first engine that keeps one (the hybrid),
    /// for heatmap rendering by external consumers.
    pub fn pheromone_snapshot(&self) -> Option<Vec<Vec<f64>>> {
        self.engines.iter().find_map(|e| e.pheromone_snapshot())
    }

    /// Run every engine to its budget and collect results.
    pub fn run(&mut self) -> Vec<EngineRunResult> {
        while !self.finished() {
            self.tick();
        }
        self.results()
    }

    /// Results accumulated so far.
    pub fn results(&self) -> Vec<EngineRunResult> {
        self.engines
            .iter()
            .zip(self.histories.iter())
            .map(|(engine, history)| {
                let report = engine.report();
                EngineRunResult {
                    engine: report.engine,
                    instance: self.instance.name.clone(),
                    best_cost: report.best_cost_ever,
                    best_tour: report.best_tour,
                    generations: report.generation,
                    time: report.elapsed,
                    history: history.clone(),
                }
            })
            .collect()
    }
}

/// Run the configured comparison `runs` times with decorrelated seeds, in
/// parallel. Each run owns its instance, movement model and engines.
pub fn run_repeated(config: &SolverConfig, runs: usize) -> Result<Vec<Vec<EngineRunResult>>, String> {
    use rayon::prelude::*;

    config.validate()?;

    (0..runs as u64)
        .into_par_iter()
        .map(|run| {
            // Same instance every run; engine and movement seeds decorrelate
            let mut run_config = config.clone();
            run_config.movement_seed = config.movement_seed.wrapping_add(run);
            run_config.sga.seed = config.sga.seed.wrapping_add(run);
            run_config.hga.seed = config.hga.seed.wrapping_add(run);
            run_config.pso.seed = config.pso.seed.wrapping_add(run);

            let mut harness = ComparisonHarness::from_config(&run_config)?;
            Ok(harness.run())
        })
        .collect()
}

/// Aggregate repeated-run results per engine.
pub fn summarize(runs: &[Vec<EngineRunResult>], instance: &str, dynamic: bool) -> ComparisonSummary {
    let mut statistics = Vec::new();

    let engine_names: Vec<String> = runs
        .first()
        .map(|results| results.iter().map(|r| r.engine.clone()).collect())
        .unwrap_or_default();

    for name in engine_names {
        let costs: Vec<f64> = runs
            .iter()
            .flat_map(|results| results.iter())
            .filter(|r| r.engine == name)
            .map(|r| r.best_cost)
            .collect();
        let times: Vec<f64> = runs
            .iter()
            .flat_map(|results| results.iter())
            .filter(|r| r.engine == name)
            .map(|r| r.time)
            .collect();

        let std_cost = if costs.len() > 1 { (&costs).std_dev() } else { 0.0 };
        statistics.push(AlgorithmStatistics {
            engine: name,
            runs: costs.len(),
            mean_cost: (&costs).mean(),
            std_cost,
            best_cost: costs.iter().cloned().fold(f64::INFINITY, f64::min),
            worst_cost: costs.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            mean_time: (&times).mean(),
        });
    }

    ComparisonSummary {
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        instance: instance.to_string(),
        dynamic,
        statistics,
    }
}

/// Write one run's convergence histories as CSV.
pub fn write_history_csv<P: AsRef<Path>>(path: P, results: &[EngineRunResult]) -> Result<(), String> {
    let file = File::create(&path).map_err(|e| format!("cannot create CSV file: {}", e))?;
    let mut writer = csv::Writer::from_writer(file);

    for result in results {
        for record in &result.history {
            writer
                .serialize(record)
                .map_err(|e| format!("CSV write error: {}", e))?;
        }
    }
    writer.flush().map_err(|e| format!("CSV flush error: {}", e))?;

    Ok(())
}

/// Write a comparison summary as pretty JSON.
pub fn write_summary_json<P: AsRef<Path>>(path: P, summary: &ComparisonSummary) -> Result<(), String> {
    let file = File::create(&path).map_err(|e| format!("cannot create JSON file: {}", e))?;
    serde_json::to_writer_pretty(file, summary).map_err(|e| format!("JSON write error: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::{SgaConfig, SgaEngine};

    fn small_config() -> SolverConfig {
        let mut config = SolverConfig::preset_for(10);
        config.num_cities = 10;
        config.sga.population_size = 20;
        config.sga.generations = 30;
        config.hga.population_size = 15;
        config.hga.generations = 20;
        config.pso.num_particles = 8;
        config.pso.generations = 25;
        config
    }

    #[test]
    fn test_static_comparison_runs_all_engines_to_budget() {
        let config = small_config();
        let mut harness = ComparisonHarness::from_config(&config).unwrap();
        let results = harness.run();

        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.best_cost.is_finite());
            assert_eq!(result.best_tour.len(), config.num_cities);
            assert!(!result.history.is_empty());
        }

        let by_name: Vec<(&str, usize)> = results
            .iter()
            .map(|r| (r.engine.as_str(), r.generations))
            .collect();
        assert!(by_name.contains(&("SGA", 30)));
        assert!(by_name.contains(&("HGA-ACO", 20)));
        assert!(by_name.contains(&("PSO", 25)));
    }

    #[test]
    fn test_engines_only_step_until_their_budget() {
        let config = small_config();
        let mut harness = ComparisonHarness::from_config(&config).unwrap();

        let mut ticks = 0;
        while !harness.finished() {
            harness.tick();
            ticks += 1;
        }
        // Longest budget dictates the tick count
        assert_eq!(ticks, 30);

        let results = harness.results();
        for result in results {
            assert_eq!(result.history.len(), result.generations);
        }
    }

    #[test]
    fn test_pheromone_snapshot_exposed_through_harness() {
        let config = small_config();
        let mut harness = ComparisonHarness::from_config(&config).unwrap();
        harness.tick();

        let snapshot = harness.pheromone_snapshot().unwrap();
        assert_eq!(snapshot.len(), config.num_cities);
        for row in &snapshot {
            assert_eq!(row.len(), config.num_cities);
        }

        let mut no_hybrid = small_config();
        no_hybrid.enable_hga_aco = false;
        let harness = ComparisonHarness::from_config(&no_hybrid).unwrap();
        assert!(harness.pheromone_snapshot().is_none());
    }

    #[test]
    fn test_dynamic_run_rescored_every_tick() {
        let config = small_config();
        let mut harness = ComparisonHarness::from_config(&{
            let mut c = config.clone();
            c.dynamic = true;
            c
        })
        .unwrap();

        for _ in 0..20 {
            let reports = harness.tick();
            for report in &reports {
                // Every exposed best cost must be re-derived from the live
                // matrix, never served from a stale cache
                let live_best = harness.instance().tour_length(&report.best_tour);
                assert!(
                    (report.best_cost_ever - live_best).abs() < 1e-9,
                    "{}: best_cost_ever {} diverged from live cost {}",
                    report.engine,
                    report.best_cost_ever,
                    live_best
                );
            }
        }
    }

    #[test]
    fn test_single_moving_city_current_best_rises_and_falls() {
        // One city oscillates between two fixed points while the rest stay
        // put; the optimal cost must move both ways over the run
        let coords = vec![
            (10.0, 10.0),
            (20.0, 10.0),
            (20.0, 20.0),
            (10.0, 20.0),
            (15.0, 30.0),
        ];
        let instance = TspInstance::from_coords("oscillate", &coords, 100.0, 100.0).unwrap();
        let mut engine = SgaEngine::new(SgaConfig {
            population_size: 20,
            generations: 200,
            ..Default::default()
        });
        engine.initialize(&instance);
        let mut instance = instance;

        let near = (15.0, 30.0);
        let far = (15.0, 90.0);
        let mut current_rose = false;
        let mut current_fell = false;
        let mut previous: Option<EngineReport> = None;

        for t in 0..150 {
            // Triangle wave: 75 ticks out, 75 ticks back
            let phase = if t < 75 { t as f64 / 75.0 } else { (150 - t) as f64 / 75.0 };
            instance.cities[4].x = near.0 + phase * (far.0 - near.0);
            instance.cities[4].y = near.1 + phase * (far.1 - near.1);
            instance.rebuild_distances();
            engine.rescore(&instance);

            let report = engine.step(&instance);
            let live_best = instance.tour_length(&report.best_tour);
            assert!((report.best_cost_ever - live_best).abs() < 1e-9);

            if let Some(prev) = &previous {
                if report.current_best_cost > prev.current_best_cost + 1e-9 {
                    current_rose = true;
                }
                if report.current_best_cost < prev.current_best_cost - 1e-9 {
                    current_fell = true;
                }
            }
            previous = Some(report.clone());
        }

        assert!(current_rose, "current_best_cost never increased");
        assert!(current_fell, "current_best_cost never decreased");

        // Movement-free interval: best-ever is monotone again
        let mut previous_best = engine.report().best_cost_ever;
        for _ in 0..30 {
            let report = engine.step(&instance);
            assert!(report.best_cost_ever <= previous_best + 1e-9);
            previous_best = report.best_cost_ever;
        }
    }

    #[test]
    fn test_summarize_aggregates_costs() {
        let mut config = small_config();
        config.enable_hga_aco = false;
        config.enable_pso = false;
        config.sga.generations = 10;

        let runs = run_repeated(&config, 3).unwrap();
        assert_eq!(runs.len(), 3);

        let summary = summarize(&runs, "test", false);
        assert_eq!(summary.statistics.len(), 1);
        let stats = &summary.statistics[0];
        assert_eq!(stats.engine, "SGA");
        assert_eq!(stats.runs, 3);
        assert!(stats.best_cost <= stats.mean_cost);
        assert!(stats.mean_cost <= stats.worst_cost);
        assert!(stats.std_cost >= 0.0);
    }
}
