//! Dynamic TSP Solver - Command Line Interface
//!
//! Runs the SGA, HGA-ACO and PSO engines against a shared (optionally
//! moving) TSP instance and reports convergence and timing.

use clap::{Parser, Subcommand, ValueEnum};
use dtsp_solver::config::SolverConfig;
use dtsp_solver::harness::{
    run_repeated, summarize, write_history_csv, write_summary_json, ComparisonHarness,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dtsp-solver")]
#[command(version = "1.0")]
#[command(about = "Compare SGA, HGA-ACO and PSO metaheuristics on static and dynamic TSP instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one comparison and print per-engine results
    Solve {
        /// Number of cities
        #[arg(short, long, default_value = "50")]
        cities: usize,

        /// Grid width
        #[arg(long, default_value = "100")]
        width: f64,

        /// Grid height
        #[arg(long, default_value = "100")]
        height: f64,

        /// Seed for city generation
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Algorithms to run
        #[arg(short, long, value_enum, default_value = "all")]
        algorithm: Algorithm,

        /// Move cities during the run
        #[arg(short, long)]
        dynamic: bool,

        /// Seed for city movement
        #[arg(long, default_value = "1")]
        movement_seed: u64,

        /// Write convergence history to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the comparison several times and aggregate statistics
    Compare {
        /// Number of cities
        #[arg(short, long, default_value = "50")]
        cities: usize,

        /// Seed for city generation
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Number of independent runs
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Move cities during the runs
        #[arg(short, long)]
        dynamic: bool,

        /// Write the aggregated summary to this JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Algorithm {
    /// Standard Genetic Algorithm
    Sga,
    /// Hybrid GA-ACO
    HgaAco,
    /// Discrete Particle Swarm Optimization
    Pso,
    /// All three
    All,
}

fn build_config(cities: usize, width: f64, height: f64, seed: u64, algorithm: Algorithm, dynamic: bool, movement_seed: u64) -> SolverConfig {
    let mut config = SolverConfig::preset_for(cities);
    config.num_cities = cities;
    config.grid_width = width;
    config.grid_height = height;
    config.city_seed = seed;
    config.dynamic = dynamic;
    config.movement_seed = movement_seed;

    config.enable_sga = matches!(algorithm, Algorithm::Sga | Algorithm::All);
    config.enable_hga_aco = matches!(algorithm, Algorithm::HgaAco | Algorithm::All);
    config.enable_pso = matches!(algorithm, Algorithm::Pso | Algorithm::All);

    config
}

fn solve(config: &SolverConfig, output: Option<PathBuf>) -> Result<(), String> {
    let mut harness = ComparisonHarness::from_config(config)?;

    println!(
        "Instance: {} cities on {}x{} grid (seed {}){}",
        config.num_cities,
        config.grid_width,
        config.grid_height,
        config.city_seed,
        if config.dynamic { ", dynamic" } else { "" }
    );

    let bar = ProgressBar::new(harness.max_budget() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} generations {msg}")
            .expect("valid progress template"),
    );

    while !harness.finished() {
        let reports = harness.tick();
        if let Some(best) = reports
            .iter()
            .min_by(|a, b| a.best_cost_ever.total_cmp(&b.best_cost_ever))
        {
            bar.set_message(format!("best {:.2} ({})", best.best_cost_ever, best.engine));
        }
        bar.inc(1);
    }
    bar.finish();

    let results = harness.results();

    println!("\n{:=^60}", " Final Results ");
    for result in &results {
        println!("\n{}:", result.engine);
        println!("  Best Cost: {:.2}", result.best_cost);
        println!("  Generations: {}", result.generations);
        println!("  Execution Time: {:.2}s", result.time);
    }

    if let Some(path) = output {
        write_history_csv(&path, &results)?;
        println!("\nConvergence history written to {}", path.display());
    }

    Ok(())
}

fn compare(config: &SolverConfig, runs: usize, output: Option<PathBuf>) -> Result<(), String> {
    println!(
        "Running {} independent comparisons of {} cities{}...",
        runs,
        config.num_cities,
        if config.dynamic { " (dynamic)" } else { "" }
    );

    let results = run_repeated(config, runs)?;
    let instance_name = format!("random-{}", config.num_cities);
    let summary = summarize(&results, &instance_name, config.dynamic);

    println!("\n{:=^72}", " Comparison ");
    println!(
        "{:<10} {:>6} {:>12} {:>10} {:>12} {:>12} {:>9}",
        "Engine", "Runs", "Mean Cost", "Std", "Best", "Worst", "Mean s"
    );
    for stats in &summary.statistics {
        println!(
            "{:<10} {:>6} {:>12.2} {:>10.2} {:>12.2} {:>12.2} {:>9.2}",
            stats.engine,
            stats.runs,
            stats.mean_cost,
            stats.std_cost,
            stats.best_cost,
            stats.worst_cost,
            stats.mean_time
        );
    }

    if let Some(path) = output {
        write_summary_json(&path, &summary)?;
        println!("\nSummary written to {}", path.display());
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve {
            cities,
            width,
            height,
            seed,
            algorithm,
            dynamic,
            movement_seed,
            output,
        } => {
            let config = build_config(cities, width, height, seed, algorithm, dynamic, movement_seed);
            solve(&config, output)
        }

        Commands::Compare {
            cities,
            seed,
            runs,
            dynamic,
            output,
        } => {
            let config = build_config(cities, 100.0, 100.0, seed, Algorithm::All, dynamic, 1);
            compare(&config, runs, output)
        }
    };

    if let Err(message) = outcome {
        eprintln!("Error: {}", message);
        std::process::exit(1);
    }
}
