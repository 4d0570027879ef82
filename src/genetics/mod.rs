//! Genetics module - parent selection, crossover and mutation for births.
//!
//! A birth at an empty cell builds the newborn's gene from its live
//! neighbors: two roulette-wheel picks weighted by survival probability,
//! uniform crossover, then per-locus mutation. With no live neighbor the
//! gene is drawn uniformly at random.

pub mod crossover;
pub mod selection;

pub use crossover::{crossover, mutate};
pub use selection::select_parent;

use crate::config::SimParams;
use crate::gene::Gene;
use crate::grid::Grid;
use crate::probability::survival_probability;
use rand::RngCore;

/// Produce the gene of a cell born at `index`.
///
/// Draw order: two selection draws, four crossover coins, then per locus a
/// mutation gate and, on mutation, one replacement draw. The no-parent
/// fallback takes four draws.
pub fn reproduce<R: RngCore + ?Sized>(
    grid: &Grid,
    influence: &[f64],
    index: usize,
    params: &SimParams,
    rng: &mut R,
) -> Gene {
    let parents = grid.alive_neighbors(index);
    if parents.is_empty() {
        return Gene::random(rng);
    }

    let candidates: Vec<Gene> = parents
        .iter()
        .filter_map(|&i| grid.cell(i).gene)
        .collect();
    // Fitness reuses the survival curve at each parent's own influence
    let fitness: Vec<f64> = parents
        .iter()
        .map(|&i| survival_probability(influence[i], params))
        .collect();

    let parent_a = select_parent(&candidates, &fitness, rng);
    let parent_b = select_parent(&candidates, &fitness, rng);

    let child = crossover(&parent_a, &parent_b, rng);
    mutate(child, params.p_mut, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PARAMS;
    use crate::gene::GeneValue;
    use crate::grid::Cell;
    use crate::influence::compute_influence;
    use crate::rng::Mulberry32;

    #[test]
    fn test_no_parents_draws_random_gene() {
        let grid = Grid::new(3, 3).unwrap();
        let influence = compute_influence(&grid);
        let mut rng = Mulberry32::new(8);
        let mut reference = Mulberry32::new(8);

        let gene = reproduce(&grid, &influence, 4, &DEFAULT_PARAMS, &mut rng);
        assert_eq!(gene, Gene::random(&mut reference));
        assert_eq!(rng.state(), reference.state());
    }

    #[test]
    fn test_single_parent_without_mutation_clones() {
        let mut grid = Grid::new(3, 3).unwrap();
        let gene = Gene::new(GeneValue::Two, GeneValue::Six, GeneValue::Eight, GeneValue::Ten);
        grid.set_cell(0, Cell::newborn(gene));
        let influence = compute_influence(&grid);
        let params = SimParams { p_mut: 0.0, ..DEFAULT_PARAMS };

        let mut rng = Mulberry32::new(1);
        for _ in 0..50 {
            assert_eq!(reproduce(&grid, &influence, 4, &params, &mut rng), gene);
        }
    }

    #[test]
    fn test_child_loci_come_from_parents() {
        let mut grid = Grid::new(3, 3).unwrap();
        let a = Gene::uniform(GeneValue::Two);
        let b = Gene::uniform(GeneValue::Ten);
        grid.set_cell(1, Cell::newborn(a));
        grid.set_cell(7, Cell::newborn(b));
        let influence = compute_influence(&grid);
        let params = SimParams { p_mut: 0.0, ..DEFAULT_PARAMS };

        let mut rng = Mulberry32::new(2024);
        for _ in 0..100 {
            let child = reproduce(&grid, &influence, 4, &params, &mut rng);
            assert!(child.0.iter().all(|&v| v == GeneValue::Two || v == GeneValue::Ten));
        }
    }

    #[test]
    fn test_draw_count_with_parents() {
        // Two selections + four coins + four mutation gates, no mutation hits
        let mut grid = Grid::new(3, 3).unwrap();
        grid.set_cell(0, Cell::newborn(Gene::uniform(GeneValue::Four)));
        let influence = compute_influence(&grid);
        let params = SimParams { p_mut: 0.0, ..DEFAULT_PARAMS };

        let mut rng = Mulberry32::new(31);
        let mut reference = Mulberry32::new(31);
        reproduce(&grid, &influence, 4, &params, &mut rng);
        for _ in 0..10 {
            reference.next_f64();
        }
        assert_eq!(rng.state(), reference.state());
    }
}
