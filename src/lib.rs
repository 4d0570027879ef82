//! # GA Life
//!
//! Torus cellular automaton whose cells carry directional form genes, with a
//! small genetic algorithm running at every birth.
//!
//! ## Features
//!
//! - **Deterministic**: seeded Mulberry32 generator with a fixed draw order
//! - **Parallel**: optional Rayon tick with per-cell generator substreams
//! - **Observable**: density, age, gene entropy and cluster statistics per tick
//! - **Configurable**: YAML configuration files
//! - **Portable state**: validated JSON state files and binary checkpoints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ga_life::{Config, Simulation};
//!
//! let mut sim = Simulation::new_with_seed(Config::default(), 12345).unwrap();
//! sim.run(100);
//!
//! println!("Alive: {}", sim.population());
//! println!("Hash: {}", sim.hash());
//! ```
//!
//! ## Kernel
//!
//! ```rust
//! use ga_life::{advance, create_grid, hash_grid, Mulberry32, DEFAULT_PARAMS};
//!
//! let mut rng = Mulberry32::new(12345);
//! let mut grid = create_grid(10, 10, 0.25, &mut rng).unwrap();
//! for _ in 0..5 {
//!     grid = advance(&grid, &DEFAULT_PARAMS, &mut rng).grid;
//! }
//! assert_eq!(hash_grid(&grid), "f5e8a3d6");
//! ```
//!
//! ## State files
//!
//! ```rust,no_run
//! use ga_life::checkpoint::{load_state, save_state};
//! use ga_life::{Config, Simulation};
//!
//! let mut sim = Simulation::new_with_seed(Config::default(), 7).unwrap();
//! sim.run(50);
//! save_state("state.json", &sim.to_state()).unwrap();
//!
//! let loaded = load_state("state.json").unwrap();
//! let resumed = Simulation::from_state(loaded, Config::default());
//! assert_eq!(resumed.hash(), sim.hash());
//! ```

pub mod checkpoint;
pub mod config;
pub mod export;
pub mod gene;
pub mod genetics;
pub mod grid;
pub mod hash;
pub mod influence;
pub mod probability;
pub mod rng;
pub mod stats;
pub mod terrain;
pub mod validation;
pub mod world;

// Re-export main types
pub use config::{Config, SimParams, DEFAULT_PARAMS};
pub use gene::{Gene, GeneValue};
pub use grid::{create_grid, Cell, Grid, Terrain};
pub use hash::hash_grid;
pub use rng::Mulberry32;
pub use stats::SimStats;
pub use world::{advance, advance_parallel, Simulation, StepResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark on a square grid
pub fn benchmark(ticks: u64, size: usize, parallel: bool) -> Result<BenchmarkResult, grid::GridError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.world.width = size;
    config.world.height = size;
    config.run.parallel = parallel;

    let mut sim = Simulation::new_with_seed(config, 12345)?;
    let initial_alive = sim.population();

    let start = Instant::now();
    sim.run(ticks);
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        ticks,
        cells: size * size,
        parallel,
        initial_alive,
        final_alive: sim.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        ticks_per_second: ticks as f64 / elapsed.as_secs_f64(),
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub ticks: u64,
    pub cells: usize,
    pub parallel: bool,
    pub initial_alive: usize,
    pub final_alive: usize,
    pub elapsed_secs: f64,
    pub ticks_per_second: f64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(f, "Cells: {} ({})", self.cells, if self.parallel { "parallel" } else { "sequential" })?;
        writeln!(f, "Alive: {} -> {}", self.initial_alive, self.final_alive)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} ticks/s", self.ticks_per_second)?;
        Ok(())
    }
}
