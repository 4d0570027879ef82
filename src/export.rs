//! Stats history export for analysis in external tools.

use crate::config::SimParams;
use crate::stats::{SimStats, StatsHistory, StatsRecord};
use crate::world::Simulation;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

/// One history entry as exported: the tick followed by the flat stats fields
#[derive(Debug, Serialize)]
pub struct ExportRecord<'a> {
    pub tick: u64,
    #[serde(flatten)]
    pub stats: &'a SimStats,
}

impl<'a> From<&'a StatsRecord> for ExportRecord<'a> {
    fn from(record: &'a StatsRecord) -> Self {
        Self {
            tick: record.tick,
            stats: &record.stats,
        }
    }
}

/// Exported stats history document
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsExport<'a> {
    pub seed: u32,
    pub final_tick: u64,
    pub params: SimParams,
    pub history: Vec<ExportRecord<'a>>,
}

impl<'a> StatsExport<'a> {
    pub fn new(seed: u32, final_tick: u64, params: SimParams, history: &'a StatsHistory) -> Self {
        Self {
            seed,
            final_tick,
            params,
            history: history.snapshots.iter().map(ExportRecord::from).collect(),
        }
    }

    pub fn from_simulation(simulation: &'a Simulation) -> Self {
        Self::new(
            simulation.seed(),
            simulation.tick,
            *simulation.params(),
            &simulation.stats_history,
        )
    }
}

/// Export system for saving simulation data
pub struct ExportSystem;

impl ExportSystem {
    /// Export the stats history document as pretty JSON
    pub fn export_history_json<P: AsRef<Path>>(simulation: &Simulation, path: P) -> Result<()> {
        let document = StatsExport::from_simulation(simulation);
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Export the scalar columns of the stats history to CSV
    pub fn export_history_csv<P: AsRef<Path>>(history: &StatsHistory, path: P) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(
            file,
            "tick,alive,density,avg_age,births,deaths,gene_entropy,cluster_count,avg_cluster_size,largest_cluster_size,density_normal,density_double,density_half"
        )?;

        for record in &history.snapshots {
            let s = &record.stats;
            let t = &s.terrain_breakdown;
            writeln!(
                file,
                "{},{},{:.6},{:.4},{},{},{:.6},{},{:.4},{},{:.6},{:.6},{:.6}",
                record.tick,
                s.alive_count,
                s.density,
                s.avg_age,
                s.births,
                s.deaths,
                s.gene_entropy,
                s.cluster_count,
                s.avg_cluster_size,
                s.largest_cluster_size,
                t.normal.density,
                t.double.density,
                t.half.density,
            )?;
        }

        file.flush()
    }

    /// Export a plain-text summary of the current state
    pub fn export_summary<P: AsRef<Path>>(simulation: &Simulation, path: P) -> Result<()> {
        let mut file = File::create(path)?;
        let stats = &simulation.stats;

        writeln!(file, "=== GA Life Simulation Summary ===")?;
        writeln!(file, "Tick: {}", simulation.tick)?;
        writeln!(file, "Seed: {}", simulation.seed())?;
        writeln!(file, "Grid: {}x{}", simulation.grid.width(), simulation.grid.height())?;
        writeln!(file, "Hash: {}", simulation.hash())?;
        writeln!(file)?;

        writeln!(file, "=== Population ===")?;
        writeln!(file, "Alive: {}", stats.alive_count)?;
        writeln!(file, "Density: {:.4}", stats.density)?;
        writeln!(file, "Average Age: {:.2}", stats.avg_age)?;
        writeln!(file, "Gene Entropy: {:.4} bits", stats.gene_entropy)?;
        writeln!(
            file,
            "Clusters: {} (avg {:.2}, largest {})",
            stats.cluster_count, stats.avg_cluster_size, stats.largest_cluster_size
        )?;
        writeln!(file)?;

        writeln!(file, "=== Terrain ===")?;
        for (name, subset) in [
            ("normal", &stats.terrain_breakdown.normal),
            ("double", &stats.terrain_breakdown.double),
            ("half", &stats.terrain_breakdown.half),
        ] {
            writeln!(
                file,
                "{:<7} cells {:6}  alive {:6}  density {:.4}  entropy {:.4}",
                name, subset.cell_count, subset.alive_count, subset.density, subset.gene_entropy
            )?;
        }

        Ok(())
    }
}
