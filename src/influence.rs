//! Influence propagation.
//!
//! Every live cell pushes eight directional values onto its neighbors:
//! orthogonal directions carry the gene value itself, diagonals carry the
//! mean of the two adjacent orthogonals minus one. All eight are scaled by
//! the source cell's terrain multiplier. Accumulated totals are rounded to
//! one decimal place.

use crate::gene::{Gene, Locus};
use crate::grid::{Direction, Grid};
use rayon::prelude::*;

/// Per-cell influence totals (`S_total`), rebuilt every tick
pub type InfluenceGrid = Vec<f64>;

/// The eight outgoing influence values of a live cell, indexed by
/// [`Direction::index`], before the terrain multiplier.
pub fn directional_influence(gene: &Gene) -> [f64; 8] {
    let u = gene.get(Locus::Up).as_f64();
    let d = gene.get(Locus::Down).as_f64();
    let l = gene.get(Locus::Left).as_f64();
    let r = gene.get(Locus::Right).as_f64();
    [
        u,
        d,
        l,
        r,
        (u + l) / 2.0 - 1.0,
        (u + r) / 2.0 - 1.0,
        (d + l) / 2.0 - 1.0,
        (d + r) / 2.0 - 1.0,
    ]
}

/// Round half toward positive infinity, matching `Math.round`-style
/// rounding so ties resolve identically everywhere.
#[inline]
pub fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Round to one decimal place
#[inline]
pub fn round_tenth(x: f64) -> f64 {
    round_half_up(x * 10.0) / 10.0
}

/// Compute the influence grid by scattering each live cell onto its
/// neighbors in index order.
pub fn compute_influence(grid: &Grid) -> InfluenceGrid {
    let mut totals = vec![0.0f64; grid.len()];

    for (i, cell) in grid.cells().iter().enumerate() {
        let Some(gene) = cell.gene else {
            continue;
        };
        let multiplier = grid.terrain_at(i).multiplier();
        let values = directional_influence(&gene);

        for direction in Direction::ALL {
            let target = grid.neighbor(i, direction);
            totals[target] += values[direction.index()] * multiplier;
        }
    }

    totals.into_iter().map(round_tenth).collect()
}

/// Parallel variant: each cell gathers from its eight sources.
///
/// Every contribution is a multiple of 0.5, so the sums are exact and the
/// result is identical to [`compute_influence`].
pub fn compute_influence_parallel(grid: &Grid) -> InfluenceGrid {
    (0..grid.len())
        .into_par_iter()
        .map(|target| {
            let mut total = 0.0;
            for direction in Direction::ALL {
                let source = grid.neighbor(target, direction.opposite());
                if let Some(gene) = grid.cell(source).gene {
                    let multiplier = grid.terrain_at(source).multiplier();
                    total += directional_influence(&gene)[direction.index()] * multiplier;
                }
            }
            round_tenth(total)
        })
        .collect()
}
