//! Load-boundary validation of persisted simulation state.
//!
//! The persisted JSON document is read into loose record types first
//! ([`PersistedState`], [`GridRecord`], [`CellRecord`]) so every rule can be
//! checked and reported with a precise [`ValidationError`]. Only then is it
//! turned into typed values. Nothing past this module sees unchecked data.
//!
//! One normalization is applied instead of a rejection: a dead cell whose
//! gene is not the zero placeholder is loaded as a plain dead cell.
//!
//! Documents written by this crate also carry the tick mode, the last tick's
//! statistics and the statistics history. All three are optional so plain
//! grid documents from other tools still load.

use crate::config::SimParams;
use crate::gene::{Gene, GeneValue};
use crate::grid::{checked_len, Cell, Grid, GridError, Terrain, UnknownTerrain};
use crate::rng::normalize_seed;
use crate::stats::{SimStats, StatsHistory};
use log::warn;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};

/// Newest persisted-state schema this crate reads and the one it writes
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Persisted simulation state as stored on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<i64>,
    pub grid: GridRecord,
    pub params: SimParams,
    pub seed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rng_state: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tick: Option<u64>,
    /// Whether the run uses the parallel tick
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    /// Statistics of the tick that produced `grid`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<SimStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats_history: Option<StatsHistory>,
}

/// Grid as stored on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridRecord {
    pub width: i64,
    pub height: i64,
    pub cells: Vec<CellRecord>,
    pub terrain: Vec<String>,
}

/// Cell as stored on disk
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRecord {
    pub is_alive: bool,
    #[serde(serialize_with = "serialize_gene")]
    pub gene: [f64; 4],
    pub age: i64,
}

/// Writes integral gene values without a fractional part
fn serialize_gene<S: Serializer>(gene: &[f64; 4], serializer: S) -> Result<S::Ok, S::Error> {
    let mut tuple = serializer.serialize_tuple(4)?;
    for value in gene {
        if value.fract() == 0.0 && value.abs() < 9.0e15 {
            tuple.serialize_element(&(*value as i64))?;
        } else {
            tuple.serialize_element(value)?;
        }
    }
    tuple.end()
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        Self {
            is_alive: cell.is_alive(),
            gene: cell.gene_values().map(f64::from),
            age: i64::from(cell.age),
        }
    }
}

impl From<&Grid> for GridRecord {
    fn from(grid: &Grid) -> Self {
        Self {
            width: grid.width() as i64,
            height: grid.height() as i64,
            cells: grid.cells().iter().map(CellRecord::from).collect(),
            terrain: grid.terrain().iter().map(|t| t.name().to_string()).collect(),
        }
    }
}

/// Rejections raised at the load boundary
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("schema version {found} is not supported (expected 1..={current})")]
    SchemaVersion { found: i64, current: u32 },
    #[error("grid dimensions must be positive integers, got {width}x{height}")]
    Dimensions { width: i64, height: i64 },
    #[error("a {width}x{height} grid needs {expected} cells, found {found}")]
    CellCount {
        width: i64,
        height: i64,
        expected: usize,
        found: usize,
    },
    #[error("terrain has {found} entries but the grid has {expected} cells")]
    TerrainCount { expected: usize, found: usize },
    #[error("cell {index}: age {age} is out of range")]
    Age { index: usize, age: i64 },
    #[error("cell {index}: live cell gene {gene:?} is outside the gene domain")]
    LiveGene { index: usize, gene: [f64; 4] },
    #[error("cell {index}: dead cell gene {gene:?} is not finite")]
    DeadGene { index: usize, gene: [f64; 4] },
    #[error("terrain {index}: {source}")]
    Terrain {
        index: usize,
        #[source]
        source: UnknownTerrain,
    },
    #[error("initial density {0} is not finite")]
    InitialDensity(f64),
    #[error("stats report {recorded} live cells but the grid has {actual}")]
    StatsMismatch { recorded: usize, actual: usize },
    #[error("stats history interval must be positive")]
    HistoryInterval,
    #[error("stats history record {index} (tick {tick}) is out of order or past tick {current}")]
    HistoryOrder { index: usize, tick: u64, current: u64 },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// A grid that passed validation
#[derive(Clone, Debug, PartialEq)]
pub struct ValidatedGrid {
    pub grid: Grid,
    /// Dead cells whose gene was reset to the placeholder
    pub normalized_cells: usize,
}

/// A persisted state that passed validation
#[derive(Clone, Debug, PartialEq)]
pub struct LoadedState {
    pub grid: Grid,
    pub params: SimParams,
    /// Seed after unsigned 32-bit normalization
    pub seed: u32,
    pub initial_density: Option<f64>,
    pub rng_state: Option<u32>,
    pub tick: u64,
    pub parallel: Option<bool>,
    /// Last tick's statistics, taken from the history when not stored
    pub stats: Option<SimStats>,
    pub stats_history: Option<StatsHistory>,
    pub normalized_cells: usize,
}

/// Check the schema version against [`CURRENT_SCHEMA_VERSION`]. Absent means
/// the oldest schema.
pub fn check_schema_version(version: Option<i64>) -> Result<(), ValidationError> {
    match version {
        Some(found) if found <= 0 || found > i64::from(CURRENT_SCHEMA_VERSION) => {
            Err(ValidationError::SchemaVersion {
                found,
                current: CURRENT_SCHEMA_VERSION,
            })
        }
        _ => Ok(()),
    }
}

/// Validate a stored grid and build the typed [`Grid`]
pub fn validate_grid(record: &GridRecord) -> Result<ValidatedGrid, ValidationError> {
    if record.width <= 0 || record.height <= 0 {
        return Err(ValidationError::Dimensions {
            width: record.width,
            height: record.height,
        });
    }
    let width = usize::try_from(record.width).map_err(|_| ValidationError::Dimensions {
        width: record.width,
        height: record.height,
    })?;
    let height = usize::try_from(record.height).map_err(|_| ValidationError::Dimensions {
        width: record.width,
        height: record.height,
    })?;
    let expected = checked_len(width, height)?;

    if record.cells.len() != expected {
        return Err(ValidationError::CellCount {
            width: record.width,
            height: record.height,
            expected,
            found: record.cells.len(),
        });
    }
    if record.terrain.len() != expected {
        return Err(ValidationError::TerrainCount {
            expected,
            found: record.terrain.len(),
        });
    }

    let mut normalized_cells = 0;
    let mut cells = Vec::with_capacity(expected);
    for (index, cell) in record.cells.iter().enumerate() {
        let age = u32::try_from(cell.age).map_err(|_| ValidationError::Age {
            index,
            age: cell.age,
        })?;

        if cell.is_alive {
            let gene = live_gene(&cell.gene).ok_or(ValidationError::LiveGene {
                index,
                gene: cell.gene,
            })?;
            cells.push(Cell::alive(gene, age));
        } else {
            if cell.gene.iter().any(|v| !v.is_finite()) {
                return Err(ValidationError::DeadGene {
                    index,
                    gene: cell.gene,
                });
            }
            if cell.gene.iter().any(|&v| v != 0.0) {
                normalized_cells += 1;
            }
            cells.push(Cell { gene: None, age });
        }
    }

    let terrain = record
        .terrain
        .iter()
        .enumerate()
        .map(|(index, name)| {
            name.parse::<Terrain>()
                .map_err(|source| ValidationError::Terrain { index, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if normalized_cells > 0 {
        warn!(
            "Normalized {} dead cell gene(s) to the zero placeholder",
            normalized_cells
        );
    }

    let grid = Grid::from_parts(width, height, cells, terrain)?;
    Ok(ValidatedGrid {
        grid,
        normalized_cells,
    })
}

fn live_gene(values: &[f64; 4]) -> Option<Gene> {
    let mut gene = Gene::uniform(GeneValue::Two);
    for (slot, &value) in gene.0.iter_mut().zip(values) {
        *slot = value.try_into().ok()?;
    }
    Some(gene)
}

/// Check that history ticks strictly increase and end at or before `tick`
pub fn validate_history(history: &StatsHistory, tick: u64) -> Result<(), ValidationError> {
    if history.interval == 0 {
        return Err(ValidationError::HistoryInterval);
    }
    let mut previous = None;
    for (index, record) in history.snapshots.iter().enumerate() {
        if record.tick > tick || previous.map_or(false, |p| record.tick <= p) {
            return Err(ValidationError::HistoryOrder {
                index,
                tick: record.tick,
                current: tick,
            });
        }
        previous = Some(record.tick);
    }
    Ok(())
}

/// Validate a whole persisted state
pub fn validate_state(state: &PersistedState) -> Result<LoadedState, ValidationError> {
    check_schema_version(state.schema_version)?;
    if let Some(density) = state.initial_density {
        if !density.is_finite() {
            return Err(ValidationError::InitialDensity(density));
        }
    }
    let ValidatedGrid {
        grid,
        normalized_cells,
    } = validate_grid(&state.grid)?;
    let tick = state.tick.unwrap_or(0);

    if let Some(history) = &state.stats_history {
        validate_history(history, tick)?;
    }
    let stats = state.stats.clone().or_else(|| {
        state
            .stats_history
            .as_ref()
            .and_then(|history| history.get_at(tick))
            .map(|record| record.stats.clone())
    });
    if let Some(stats) = &stats {
        if stats.alive_count != grid.alive_count() {
            return Err(ValidationError::StatsMismatch {
                recorded: stats.alive_count,
                actual: grid.alive_count(),
            });
        }
    }

    Ok(LoadedState {
        grid,
        params: state.params,
        seed: normalize_seed(state.seed),
        initial_density: state.initial_density,
        rng_state: state.rng_state,
        tick,
        parallel: state.parallel,
        stats,
        stats_history: state.stats_history.clone(),
        normalized_cells,
    })
}
