//! Statistics for grid snapshots.
//!
//! Everything here is a pure function of one [`Grid`]. Births and deaths are
//! not visible in a single snapshot; the tick transition fills them in.

use crate::gene::{Gene, GeneValue, Locus};
use crate::grid::{Cell, Grid, Terrain};
use serde::{Deserialize, Serialize};

/// Counts per gene value, indexed by [`GeneValue::index`] (2, 4, 6, 8, 10)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCounts(pub [u64; 5]);

impl ValueCounts {
    #[inline]
    pub fn add(&mut self, value: GeneValue) {
        self.0[value.index()] += 1;
    }

    #[inline]
    pub fn count(&self, value: GeneValue) -> u64 {
        self.0[value.index()]
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }
}

/// Gene value counts per locus plus the sum over all four loci
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneHistogram {
    pub up: ValueCounts,
    pub down: ValueCounts,
    pub left: ValueCounts,
    pub right: ValueCounts,
    pub overall: ValueCounts,
}

impl GeneHistogram {
    pub fn record(&mut self, gene: &Gene) {
        for locus in Locus::ALL {
            let value = gene.get(locus);
            self.locus_mut(locus).add(value);
            self.overall.add(value);
        }
    }

    pub fn locus(&self, locus: Locus) -> &ValueCounts {
        match locus {
            Locus::Up => &self.up,
            Locus::Down => &self.down,
            Locus::Left => &self.left,
            Locus::Right => &self.right,
        }
    }

    fn locus_mut(&mut self, locus: Locus) -> &mut ValueCounts {
        match locus {
            Locus::Up => &mut self.up,
            Locus::Down => &mut self.down,
            Locus::Left => &mut self.left,
            Locus::Right => &mut self.right,
        }
    }
}

/// Metrics over one subset of live cells
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsetStats {
    /// Members of the subset
    pub alive_count: usize,
    /// Cells in the denominator (whole grid or one terrain class)
    pub cell_count: usize,
    pub density: f64,
    pub avg_age: f64,
    pub gene_entropy: f64,
    pub gene_histogram: GeneHistogram,
    pub cluster_count: usize,
    pub avg_cluster_size: f64,
    pub largest_cluster_size: usize,
}

/// Per terrain class metrics; density is relative to that class's size
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainBreakdown {
    pub normal: SubsetStats,
    pub double: SubsetStats,
    pub half: SubsetStats,
}

impl TerrainBreakdown {
    pub fn get(&self, terrain: Terrain) -> &SubsetStats {
        match terrain {
            Terrain::Normal => &self.normal,
            Terrain::Double => &self.double,
            Terrain::Half => &self.half,
        }
    }
}

/// Statistics snapshot for one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimStats {
    pub alive_count: usize,
    pub density: f64,
    pub avg_age: f64,
    /// Dead to alive transitions in the tick that produced this grid
    pub births: usize,
    /// Alive to dead transitions in the tick that produced this grid
    pub deaths: usize,
    pub gene_entropy: f64,
    pub gene_histogram: GeneHistogram,
    pub cluster_count: usize,
    pub avg_cluster_size: f64,
    pub largest_cluster_size: usize,
    pub terrain_breakdown: TerrainBreakdown,
}

impl SimStats {
    /// Compute everything derivable from one grid. Births and deaths are 0.
    pub fn from_grid(grid: &Grid) -> Self {
        let global = subset_stats(grid, grid.len(), |_, cell| cell.is_alive());
        let terrain_counts = grid.terrain_counts();
        let per_terrain = |terrain: Terrain| {
            subset_stats(grid, terrain_counts[terrain.index()], |i, cell| {
                cell.is_alive() && grid.terrain_at(i) == terrain
            })
        };
        let terrain_breakdown = TerrainBreakdown {
            normal: per_terrain(Terrain::Normal),
            double: per_terrain(Terrain::Double),
            half: per_terrain(Terrain::Half),
        };

        Self {
            alive_count: global.alive_count,
            density: global.density,
            avg_age: global.avg_age,
            births: 0,
            deaths: 0,
            gene_entropy: global.gene_entropy,
            gene_histogram: global.gene_histogram,
            cluster_count: global.cluster_count,
            avg_cluster_size: global.avg_cluster_size,
            largest_cluster_size: global.largest_cluster_size,
            terrain_breakdown,
        }
    }

    /// Format stats as a one-line summary
    pub fn summary(&self, tick: u64) -> String {
        format!(
            "T:{:6} | Alive:{:5} | Dens:{:.3} | Age:{:.1} | +{:<4} -{:<4} | H:{:.3} | Clusters:{} (max {})",
            tick,
            self.alive_count,
            self.density,
            self.avg_age,
            self.births,
            self.deaths,
            self.gene_entropy,
            self.cluster_count,
            self.largest_cluster_size,
        )
    }
}

/// Metrics over the cells selected by `member`, with density measured
/// against `cell_count`.
pub fn subset_stats<F>(grid: &Grid, cell_count: usize, member: F) -> SubsetStats
where
    F: Fn(usize, &Cell) -> bool,
{
    let members: Vec<bool> = grid
        .cells()
        .iter()
        .enumerate()
        .map(|(i, cell)| member(i, cell))
        .collect();

    let mut alive_count = 0usize;
    let mut age_sum = 0u64;
    let mut gene_histogram = GeneHistogram::default();
    for (cell, _) in grid.cells().iter().zip(&members).filter(|(_, m)| **m) {
        alive_count += 1;
        age_sum += u64::from(cell.age);
        if let Some(gene) = &cell.gene {
            gene_histogram.record(gene);
        }
    }

    let clusters = cluster_sizes(grid, &members);
    let cluster_count = clusters.len();
    let largest_cluster_size = clusters.iter().copied().max().unwrap_or(0);
    let avg_cluster_size = if cluster_count > 0 {
        clusters.iter().sum::<usize>() as f64 / cluster_count as f64
    } else {
        0.0
    };

    SubsetStats {
        alive_count,
        cell_count,
        density: ratio(alive_count as f64, cell_count as f64),
        avg_age: ratio(age_sum as f64, alive_count as f64),
        gene_entropy: shannon_entropy(&gene_histogram.overall),
        gene_histogram,
        cluster_count,
        avg_cluster_size,
        largest_cluster_size,
    }
}

#[inline]
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Shannon entropy in bits of a value distribution; 0 when empty
pub fn shannon_entropy(counts: &ValueCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .0
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            p * (1.0 / p).log2()
        })
        .sum()
}

/// Sizes of the 8-connected components among `members` on the torus.
///
/// Iterative stack-based flood fill; components are reported in order of
/// their lowest index.
pub fn cluster_sizes(grid: &Grid, members: &[bool]) -> Vec<usize> {
    let mut visited = vec![false; members.len()];
    let mut sizes = Vec::new();
    let mut stack = Vec::new();

    for start in 0..members.len() {
        if !members[start] || visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);
        let mut size = 0;

        while let Some(i) = stack.pop() {
            size += 1;
            for n in grid.neighbor_indices(i) {
                if members[n] && !visited[n] {
                    visited[n] = true;
                    stack.push(n);
                }
            }
        }
        sizes.push(size);
    }

    sizes
}

/// Statistics record for one tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatsRecord {
    pub tick: u64,
    pub stats: SimStats,
}

/// Append-only statistics history
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsHistory {
    /// All recorded snapshots, oldest first
    pub snapshots: Vec<StatsRecord>,
    /// Recording interval in ticks
    pub interval: u64,
}

impl StatsHistory {
    /// Create new history with recording interval
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Whether a tick falls on the recording interval
    pub fn should_record(&self, tick: u64) -> bool {
        tick % self.interval == 0
    }

    /// Record a stats snapshot
    pub fn record(&mut self, tick: u64, stats: SimStats) {
        self.snapshots.push(StatsRecord { tick, stats });
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn latest(&self) -> Option<&StatsRecord> {
        self.snapshots.last()
    }

    /// Get the record for an exact tick
    pub fn get_at(&self, tick: u64) -> Option<&StatsRecord> {
        self.snapshots
            .binary_search_by_key(&tick, |r| r.tick)
            .ok()
            .map(|i| &self.snapshots[i])
    }
}
