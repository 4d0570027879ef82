//! GA Life - CLI Entry Point

use clap::{Parser, Subcommand};
use ga_life::checkpoint::{load_state, save_state, Checkpoint, CheckpointManager};
use ga_life::export::ExportSystem;
use ga_life::gene::{GeneValue, Locus};
use ga_life::{benchmark, Config, Simulation};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "ga-life")]
#[command(version)]
#[command(about = "Torus cellular automaton with genetic-algorithm reproduction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a new simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Output directory for state, checkpoints and stats
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u32>,

        /// Parallel ticks (reproducible per seed, different trajectory)
        #[arg(long)]
        parallel: bool,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume from a state file (.json) or checkpoint (.bin)
    Resume {
        /// State or checkpoint file
        #[arg(short = 'f', long)]
        state: PathBuf,

        /// Number of additional ticks
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Configuration for logging and run options (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Switch to the parallel tick (the trajectory changes from here on)
        #[arg(long)]
        parallel: bool,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Print the canonical hash of a state or checkpoint file
    Hash {
        /// State or checkpoint file
        state: PathBuf,
    },

    /// Print statistics of a state or checkpoint file
    Analyze {
        /// State or checkpoint file
        state: PathBuf,

        /// Draw the grid as text
        #[arg(long)]
        render: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "200")]
        steps: u64,

        /// Grid side length
        #[arg(long, default_value = "256")]
        size: usize,

        /// Use the parallel tick
        #[arg(long)]
        parallel: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            output,
            seed,
            parallel,
            quiet,
        } => run_simulation(config, steps, output, seed, parallel, quiet),

        Commands::Resume {
            state,
            steps,
            output,
            config,
            parallel,
        } => resume_simulation(state, steps, output, config, parallel),

        Commands::Init { output } => {
            init_logging("info");
            generate_config(output)
        }

        Commands::Hash { state } => {
            init_logging("warn");
            let sim = load_simulation(&state, Config::default())?;
            println!("{}", sim.hash());
            Ok(())
        }

        Commands::Analyze { state, render } => {
            init_logging("info");
            analyze_state(state, render)
        }

        Commands::Benchmark {
            steps,
            size,
            parallel,
        } => {
            init_logging("info");
            run_benchmark(steps, size, parallel)
        }
    }
}

/// Initialize logging; `RUST_LOG` overrides `level`
fn init_logging(level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    if path.exists() {
        Ok(Config::from_file(path)?)
    } else {
        Ok(Config::default())
    }
}

/// Load a simulation from a binary checkpoint or a JSON state file
fn load_simulation(path: &Path, config: Config) -> Result<Simulation, Box<dyn std::error::Error>> {
    if path.extension().map_or(false, |ext| ext == "bin") {
        Ok(Simulation::from_checkpoint(Checkpoint::load(path)?))
    } else {
        Ok(Simulation::from_state(load_state(path)?, config))
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    output: PathBuf,
    seed: Option<u32>,
    parallel: bool,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&config_path)?;
    init_logging(&config.logging.log_level);
    if config_path.exists() {
        info!("Loaded config from {:?}", config_path);
    } else {
        info!("Using default configuration");
    }

    if seed.is_some() {
        config.run.seed = seed;
    }
    config.run.parallel |= parallel;

    let mut sim = Simulation::new(config)?;

    println!("Starting simulation");
    println!("  Seed: {}", sim.seed());
    println!("  Grid size: {}x{}", sim.grid.width(), sim.grid.height());
    println!("  Initial alive: {}", sim.population());
    println!("  Steps: {}", steps);
    println!();

    simulate(&mut sim, steps, &output, quiet)
}

fn resume_simulation(
    state_path: PathBuf,
    steps: u64,
    output: PathBuf,
    config_path: Option<PathBuf>,
    parallel: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    init_logging(&config.logging.log_level);

    let mut sim = load_simulation(&state_path, config)?;
    if parallel && !sim.config.run.parallel {
        warn!(
            "Switching to the parallel tick at tick {}; the run no longer matches a sequential one",
            sim.tick
        );
        sim.config.run.parallel = true;
    }

    println!("Resumed at tick {}", sim.tick);
    println!("Mode: {}", if sim.config.run.parallel { "parallel" } else { "sequential" });
    println!("Alive: {}", sim.population());
    println!("History: {} records", sim.stats_history.len());
    println!("Running {} additional ticks", steps);
    println!();

    simulate(&mut sim, steps, &output, false)
}

/// Shared run loop: stats output, checkpoints, final state and exports
fn simulate(
    sim: &mut Simulation,
    steps: u64,
    output: &Path,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output)?;

    let mut checkpoint_mgr = CheckpointManager::new(
        output.join("checkpoints"),
        sim.config.logging.checkpoint_interval,
        10, // Keep last 10 checkpoints
    )?;

    let start = Instant::now();
    let start_tick = sim.tick;
    let target_tick = sim.tick + steps;
    let stats_interval = sim.config.logging.stats_interval.max(1);

    while sim.tick < target_tick {
        sim.step();

        if !quiet && sim.tick % stats_interval == 0 {
            println!("{}", sim.stats.summary(sim.tick));
        }

        if checkpoint_mgr.should_save(sim.tick) {
            if let Err(e) = checkpoint_mgr.save(&sim.create_checkpoint()) {
                warn!("Checkpoint error: {}", e);
            }
        }

        if sim.is_extinct() {
            println!("\nPopulation extinct at tick {}", sim.tick);
            break;
        }
    }

    let elapsed = start.elapsed();
    let ticks_run = sim.tick - start_tick;

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", sim.tick);
    println!("Speed: {:.1} ticks/s", ticks_run as f64 / elapsed.as_secs_f64());
    println!("Final alive: {}", sim.population());
    println!("Gene entropy: {:.4}", sim.stats.gene_entropy);
    println!("Hash: {}", sim.hash());

    let state_path = output.join("state.json");
    save_state(&state_path, &sim.to_state())?;
    println!("Final state: {:?}", state_path);

    let final_checkpoint = output.join("checkpoint_final.bin");
    sim.create_checkpoint().save(&final_checkpoint)?;

    let history_path = output.join("stats_history.json");
    ExportSystem::export_history_json(sim, &history_path)?;
    ExportSystem::export_history_csv(&sim.stats_history, output.join("stats_history.csv"))?;
    ExportSystem::export_summary(sim, output.join("summary.txt"))?;
    println!("Stats history: {:?}", history_path);

    Ok(())
}

fn run_benchmark(steps: u64, size: usize, parallel: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== GA Life Benchmark ===");
    println!("Ticks: {}", steps);
    println!("Grid: {}x{}", size, size);
    println!();

    let result = benchmark(steps, size, parallel)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_state(state_path: PathBuf, render: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== State Analysis ===");
    println!("File: {:?}", state_path);
    println!();

    let sim = load_simulation(&state_path, Config::default())?;
    let stats = &sim.stats;

    println!("Tick: {}", sim.tick);
    println!("Seed: {}", sim.seed());
    println!("Mode: {}", if sim.config.run.parallel { "parallel" } else { "sequential" });
    println!("Grid: {}x{}", sim.grid.width(), sim.grid.height());
    println!("Hash: {}", sim.hash());
    println!();

    println!("Alive: {} (density {:.4})", stats.alive_count, stats.density);
    println!("Average age: {:.2}", stats.avg_age);
    println!("Gene entropy: {:.4} bits", stats.gene_entropy);
    println!(
        "Clusters: {} (avg {:.2}, largest {})",
        stats.cluster_count, stats.avg_cluster_size, stats.largest_cluster_size
    );
    match sim.stats_history.latest() {
        Some(latest) => println!(
            "History: {} records, latest at tick {}",
            sim.stats_history.len(),
            latest.tick
        ),
        None => println!("History: none stored"),
    }

    println!();
    println!("Gene histogram:");
    print!("  {:<6}", "locus");
    for value in GeneValue::ALL {
        print!("{:>7}", value.value());
    }
    println!();
    for locus in Locus::ALL {
        let counts = stats.gene_histogram.locus(locus);
        print!("  {:<6}", format!("{:?}", locus).to_lowercase());
        for value in GeneValue::ALL {
            print!("{:>7}", counts.count(value));
        }
        println!();
    }

    println!();
    println!("Terrain breakdown:");
    for (name, subset) in [
        ("normal", &stats.terrain_breakdown.normal),
        ("double", &stats.terrain_breakdown.double),
        ("half", &stats.terrain_breakdown.half),
    ] {
        println!(
            "  {:<7} cells {:6}  alive {:6}  density {:.4}  clusters {}",
            name, subset.cell_count, subset.alive_count, subset.density, subset.cluster_count
        );
    }

    if render {
        println!();
        print!("{}", sim.grid.render_ascii());
    }

    Ok(())
}
