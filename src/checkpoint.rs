//! Saving and loading simulation state.
//!
//! Two formats: the persisted-state JSON document shared with external
//! tools, validated on load, and compact binary checkpoints for the CLI.

use crate::config::Config;
use crate::grid::Grid;
use crate::stats::{SimStats, StatsHistory};
use crate::validation::{
    validate_history, validate_state, LoadedState, PersistedState, ValidationError,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"GALF";

/// Errors that can occur during save and load
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Invalid state: {0}")]
    Validation(#[from] ValidationError),
}

/// Write a persisted state document as pretty JSON
pub fn save_state<P: AsRef<Path>>(path: P, state: &PersistedState) -> Result<(), CheckpointError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, state)?;
    Ok(())
}

/// Read a persisted state document without validating it
pub fn read_state<P: AsRef<Path>>(path: P) -> Result<PersistedState, CheckpointError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Read and validate a persisted state document
pub fn load_state<P: AsRef<Path>>(path: P) -> Result<LoadedState, CheckpointError> {
    let path = path.as_ref();
    let loaded = validate_state(&read_state(path)?)?;
    info!("Loaded state from {} (tick {})", path.display(), loaded.tick);
    Ok(loaded)
}

/// Complete simulation state for binary checkpoints
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    pub tick: u64,
    pub config: Config,
    pub grid: Grid,
    /// Statistics of the tick that produced `grid`
    pub stats: SimStats,
    pub stats_history: StatsHistory,
    pub seed: u32,
    /// Generator state after `tick`
    pub rng_state: u32,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 2;

    pub fn new(
        tick: u64,
        config: Config,
        grid: Grid,
        stats: SimStats,
        stats_history: StatsHistory,
        seed: u32,
        rng_state: u32,
    ) -> Self {
        Self {
            version: Self::VERSION,
            tick,
            config,
            grid,
            stats,
            stats_history,
            seed,
            rng_state,
        }
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writer.write_all(MAGIC)?;
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        // The version leads the encoding; check it before the layout it names
        let version: u32 = bincode::deserialize(&buffer)?;
        if version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: version,
            });
        }

        let checkpoint: Checkpoint = bincode::deserialize(&buffer)?;
        validate_history(&checkpoint.stats_history, checkpoint.tick)?;
        Ok(checkpoint)
    }

    /// Encoded size in bytes, without the magic header
    pub fn size_bytes(&self) -> Result<u64, CheckpointError> {
        Ok(bincode::serialized_size(self)?)
    }
}

/// Writes checkpoints at a fixed interval and keeps the newest few
pub struct CheckpointManager {
    /// Directory holding checkpoint files
    pub base_dir: PathBuf,
    /// Ticks between checkpoints
    pub interval: u64,
    /// Maximum checkpoints to keep
    pub max_checkpoints: usize,
    last_checkpoint: Option<u64>,
}

impl CheckpointManager {
    /// Create a manager, creating `base_dir` if needed
    pub fn new<P: Into<PathBuf>>(
        base_dir: P,
        interval: u64,
        max_checkpoints: usize,
    ) -> Result<Self, CheckpointError> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;

        Ok(Self {
            base_dir,
            interval: interval.max(1),
            max_checkpoints: max_checkpoints.max(1),
            last_checkpoint: None,
        })
    }

    /// Check if a checkpoint should be saved
    pub fn should_save(&self, tick: u64) -> bool {
        tick > 0 && tick % self.interval == 0 && self.last_checkpoint != Some(tick)
    }

    /// Checkpoint filename for a tick
    pub fn checkpoint_path(&self, tick: u64) -> PathBuf {
        self.base_dir.join(format!("checkpoint_{:08}.bin", tick))
    }

    /// Save checkpoint and remove old ones
    pub fn save(&mut self, checkpoint: &Checkpoint) -> Result<PathBuf, CheckpointError> {
        let path = self.checkpoint_path(checkpoint.tick);
        checkpoint.save(&path)?;
        self.last_checkpoint = Some(checkpoint.tick);
        info!("Saved checkpoint {}", path.display());

        self.cleanup()?;
        Ok(path)
    }

    fn checkpoint_files(&self) -> Result<Vec<PathBuf>, CheckpointError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("checkpoint_") && name.ends_with(".bin")
            })
            .map(|entry| entry.path())
            .collect();
        // Zero-padded ticks sort by name
        files.sort();
        Ok(files)
    }

    /// Remove old checkpoints beyond max limit
    fn cleanup(&self) -> Result<(), CheckpointError> {
        let files = self.checkpoint_files()?;
        if files.len() > self.max_checkpoints {
            let to_remove = files.len() - self.max_checkpoints;
            for path in files.into_iter().take(to_remove) {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Find latest checkpoint in directory
    pub fn find_latest(&self) -> Option<PathBuf> {
        self.checkpoint_files().ok()?.pop()
    }
}
