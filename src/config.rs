//! Configuration system for the simulation.
//!
//! Supports YAML configuration files with sensible defaults.

use crate::grid::MAX_CELLS;
use crate::terrain::TerrainConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Probability model and mutation parameters.
///
/// All values are plain reals. `p_mut` and `epsilon` are expected in
/// `[0, 1]` but are not clamped here; only computed probabilities are.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Overall height of the probability curves
    pub alpha: f64,
    /// Curve slope
    pub beta: f64,
    /// Exponent applied to the curve body
    pub gamma: f64,
    /// Influence that maximizes survival probability
    pub mu: f64,
    /// Influence that maximizes birth probability
    pub nu: f64,
    /// Constant added to both curves
    pub delta: f64,
    /// Probabilities below this count as zero
    pub epsilon: f64,
    /// Per-locus mutation probability for newborn genes
    pub p_mut: f64,
}

/// Reference parameter set
pub const DEFAULT_PARAMS: SimParams = SimParams {
    alpha: 4.0,
    beta: -0.15,
    gamma: 1.0,
    mu: 20.0,
    nu: 27.5,
    delta: -0.07,
    epsilon: 0.03,
    p_mut: 0.02,
};

impl Default for SimParams {
    fn default() -> Self {
        DEFAULT_PARAMS
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    #[serde(default)]
    pub terrain: TerrainConfig,
    #[serde(default)]
    pub params: SimParams,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Grid configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells
    pub width: usize,
    /// Grid height in cells
    pub height: usize,
    /// Probability that each cell starts alive (0.0 - 1.0)
    pub initial_density: f64,
}

/// Run control
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Seed for the run's generator; `None` picks one from entropy
    #[serde(default)]
    pub seed: Option<u32>,
    /// Use per-cell generator streams and parallel passes.
    /// Reproducible per seed, but not draw-compatible with sequential mode.
    #[serde(default)]
    pub parallel: bool,
}

/// Logging and checkpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Ticks between stats history records
    pub stats_interval: u64,
    /// Ticks between checkpoints
    pub checkpoint_interval: u64,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 80,
            height: 60,
            initial_density: 0.25,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stats_interval: 1,
            checkpoint_interval: 100,
            log_level: "info".to_string(),
        }
    }
}

/// Errors raised while loading or saving a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Simulation parameters are passed through untouched; only the world,
    /// terrain and logging sections are checked.
    pub fn validate(&self) -> Result<(), String> {
        if self.world.width == 0 || self.world.height == 0 {
            return Err("world width and height must be > 0".to_string());
        }
        if self.world.width.checked_mul(self.world.height).map_or(true, |n| n > MAX_CELLS) {
            return Err(format!("world must have at most {} cells", MAX_CELLS));
        }
        if !(0.0..=1.0).contains(&self.world.initial_density) {
            return Err("initial_density must be between 0 and 1".to_string());
        }
        self.terrain.validate()?;
        if self.logging.stats_interval == 0 || self.logging.checkpoint_interval == 0 {
            return Err("logging intervals must be > 0".to_string());
        }
        Ok(())
    }
}
