//! Tick transition and the simulation driver.
//!
//! [`advance`] is the whole state machine: one synchronous pass that reads
//! only the frozen current grid and its influence field, and commits a fresh
//! grid. [`Simulation`] owns everything needed to call it repeatedly.

use crate::checkpoint::Checkpoint;
use crate::config::{Config, SimParams};
use crate::genetics::reproduce;
use crate::grid::{create_grid, Cell, Grid, GridError};
use crate::hash::hash_grid;
use crate::influence::{compute_influence, compute_influence_parallel};
use crate::probability::{apply_floor, birth_probability, survival_probability};
use crate::rng::{derive_cell_rng, unit, Mulberry32};
use crate::stats::{SimStats, StatsHistory};
use crate::terrain::generate_terrain;
use crate::validation::{GridRecord, LoadedState, PersistedState, CURRENT_SCHEMA_VERSION};
use log::{debug, info, warn};
use rand::{Rng, RngCore};
use rayon::prelude::*;

/// Outcome of one tick
#[derive(Clone, Debug, PartialEq)]
pub struct StepResult {
    pub grid: Grid,
    pub stats: SimStats,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Transition {
    Unchanged,
    Born,
    Died,
}

/// Decide one cell's next state from the frozen grid.
///
/// Live cells always consume one survival draw. Dead cells with a live
/// neighbor consume one birth draw, plus the reproduction draws on a birth.
fn next_cell<R: RngCore + ?Sized>(
    grid: &Grid,
    influence: &[f64],
    index: usize,
    params: &SimParams,
    rng: &mut R,
) -> (Cell, Transition) {
    let cell = *grid.cell(index);
    let s_total = influence[index];

    if cell.is_alive() {
        let p_live = apply_floor(survival_probability(s_total, params), params.epsilon);
        if unit(rng) < p_live {
            (cell.aged(), Transition::Unchanged)
        } else {
            (Cell::DEAD, Transition::Died)
        }
    } else if grid.has_alive_neighbor(index) {
        let p_born = apply_floor(birth_probability(s_total, params), params.epsilon);
        if unit(rng) < p_born {
            let gene = reproduce(grid, influence, index, params, rng);
            (Cell::newborn(gene), Transition::Born)
        } else {
            (cell, Transition::Unchanged)
        }
    } else {
        (cell, Transition::Unchanged)
    }
}

/// Commit the next cells as a new grid and compute its stats
fn commit(grid: &Grid, next: Vec<(Cell, Transition)>) -> StepResult {
    let mut births = 0;
    let mut deaths = 0;
    let cells = next
        .into_iter()
        .map(|(cell, transition)| {
            match transition {
                Transition::Born => births += 1,
                Transition::Died => deaths += 1,
                Transition::Unchanged => {}
            }
            cell
        })
        .collect();

    let grid = grid.with_cells(cells);
    let mut stats = SimStats::from_grid(&grid);
    stats.births = births;
    stats.deaths = deaths;
    StepResult { grid, stats }
}

/// Advance the grid by one tick.
///
/// Cells are visited in ascending index order against one shared generator,
/// so the result is fully determined by the generator's state.
pub fn advance<R: RngCore + ?Sized>(grid: &Grid, params: &SimParams, rng: &mut R) -> StepResult {
    let influence = compute_influence(grid);
    let next: Vec<_> = (0..grid.len())
        .map(|index| next_cell(grid, &influence, index, params, rng))
        .collect();
    commit(grid, next)
}

/// Advance the grid by one tick with every cell decided in parallel.
///
/// One `u32` from `rng` seeds the tick and each cell draws from its own
/// substream keyed by index. Runs are reproducible for a given seed, but the
/// trajectory differs from [`advance`].
pub fn advance_parallel<R: RngCore + ?Sized>(
    grid: &Grid,
    params: &SimParams,
    rng: &mut R,
) -> StepResult {
    let tick_seed = rng.next_u32();
    let influence = compute_influence_parallel(grid);
    let next: Vec<_> = (0..grid.len())
        .into_par_iter()
        .map(|index| {
            let mut cell_rng = derive_cell_rng(tick_seed, index);
            next_cell(grid, &influence, index, params, &mut cell_rng)
        })
        .collect();
    commit(grid, next)
}

/// A running simulation
pub struct Simulation {
    pub grid: Grid,

    // State
    pub tick: u64,

    // Configuration
    pub config: Config,

    // Statistics
    pub stats: SimStats,
    pub stats_history: StatsHistory,

    // Generator (seeded for reproducibility)
    rng: Mulberry32,
    seed: u32,
}

impl Simulation {
    /// Create a simulation from a configuration. Without a configured seed
    /// one is picked from entropy.
    pub fn new(config: Config) -> Result<Self, GridError> {
        let seed = config.run.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::new_with_seed(config, seed)
    }

    /// Create a simulation with a specific seed
    pub fn new_with_seed(mut config: Config, seed: u32) -> Result<Self, GridError> {
        config.run.seed = Some(seed);
        let mut rng = Mulberry32::new(seed);
        let world = &config.world;

        let mut grid = create_grid(world.width, world.height, world.initial_density, &mut rng)?;
        if !config.terrain.is_uniform() {
            let terrain = generate_terrain(world.width, world.height, &config.terrain, &mut rng);
            grid = grid.with_terrain(terrain)?;
        }

        info!(
            "Created {}x{} world (seed {}, {} alive)",
            grid.width(),
            grid.height(),
            seed,
            grid.alive_count()
        );
        Ok(Self::assemble(grid, 0, config, rng, seed, None, None))
    }

    /// Restore a simulation from a validated persisted state.
    ///
    /// The state's grid, parameters, seed and tick mode replace those in
    /// `config`. The generator resumes from `rng_state` when present,
    /// otherwise it is reseeded from the seed. A stored statistics history
    /// is continued as is.
    pub fn from_state(state: LoadedState, mut config: Config) -> Self {
        config.world.width = state.grid.width();
        config.world.height = state.grid.height();
        if let Some(density) = state.initial_density {
            config.world.initial_density = density;
        }
        config.params = state.params;
        config.run.seed = Some(state.seed);
        if let Some(parallel) = state.parallel {
            config.run.parallel = parallel;
        }

        let rng = match state.rng_state {
            Some(rng_state) => {
                let mut rng = Mulberry32::new(state.seed);
                rng.set_state(rng_state);
                rng
            }
            None => {
                if state.tick > 0 {
                    warn!(
                        "State at tick {} has no generator state; reseeding from seed {}",
                        state.tick, state.seed
                    );
                }
                Mulberry32::new(state.seed)
            }
        };

        info!(
            "Loaded {}x{} world at tick {} ({} alive)",
            state.grid.width(),
            state.grid.height(),
            state.tick,
            state.grid.alive_count()
        );
        Self::assemble(
            state.grid,
            state.tick,
            config,
            rng,
            state.seed,
            state.stats,
            state.stats_history,
        )
    }

    /// Snapshot the simulation as a persisted state document
    pub fn to_state(&self) -> PersistedState {
        PersistedState {
            schema_version: Some(i64::from(CURRENT_SCHEMA_VERSION)),
            grid: GridRecord::from(&self.grid),
            params: self.config.params,
            seed: f64::from(self.seed),
            initial_density: Some(self.config.world.initial_density),
            rng_state: Some(self.rng.state()),
            tick: Some(self.tick),
            parallel: Some(self.config.run.parallel),
            stats: Some(self.stats.clone()),
            stats_history: Some(self.stats_history.clone()),
        }
    }

    /// Restore a simulation from a binary checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Self {
        let mut rng = Mulberry32::new(checkpoint.seed);
        rng.set_state(checkpoint.rng_state);
        Self::assemble(
            checkpoint.grid,
            checkpoint.tick,
            checkpoint.config,
            rng,
            checkpoint.seed,
            Some(checkpoint.stats),
            Some(checkpoint.stats_history),
        )
    }

    /// Create a binary checkpoint of the current state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.tick,
            self.config.clone(),
            self.grid.clone(),
            self.stats.clone(),
            self.stats_history.clone(),
            self.seed,
            self.rng.state(),
        )
    }

    /// Build a simulation around `grid`. Without a stored history, only a
    /// tick 0 grid gets a snapshot: at a later tick its births and deaths are
    /// unknown.
    fn assemble(
        grid: Grid,
        tick: u64,
        config: Config,
        rng: Mulberry32,
        seed: u32,
        stats: Option<SimStats>,
        stats_history: Option<StatsHistory>,
    ) -> Self {
        let stats = stats.unwrap_or_else(|| SimStats::from_grid(&grid));
        let stats_history = stats_history.unwrap_or_else(|| {
            let mut history = StatsHistory::new(config.logging.stats_interval);
            if tick == 0 {
                history.record(0, stats.clone());
            } else {
                info!("No stats history stored; recording resumes after tick {}", tick);
            }
            history
        });

        Self {
            grid,
            tick,
            config,
            stats,
            stats_history,
            rng,
            seed,
        }
    }

    /// Advance one tick
    pub fn step(&mut self) -> &SimStats {
        let result = if self.config.run.parallel {
            advance_parallel(&self.grid, &self.config.params, &mut self.rng)
        } else {
            advance(&self.grid, &self.config.params, &mut self.rng)
        };

        self.grid = result.grid;
        self.stats = result.stats;
        self.tick += 1;

        if self.stats_history.should_record(self.tick) {
            self.stats_history.record(self.tick, self.stats.clone());
        }

        debug!(
            "tick {} alive {} births {} deaths {}",
            self.tick, self.stats.alive_count, self.stats.births, self.stats.deaths
        );

        &self.stats
    }

    /// Run simulation for specified number of ticks
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, ticks: u64, mut callback: F)
    where
        F: FnMut(&Simulation, u64),
    {
        for i in 0..ticks {
            self.step();
            callback(self, i);
        }
    }

    /// Live cell count
    pub fn population(&self) -> usize {
        self.stats.alive_count
    }

    pub fn is_extinct(&self) -> bool {
        self.population() == 0
    }

    pub fn params(&self) -> &SimParams {
        &self.config.params
    }

    /// Seed for reproducibility
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Current generator state
    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Canonical hash of the current grid
    pub fn hash(&self) -> String {
        hash_grid(&self.grid)
    }
}
