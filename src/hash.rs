//! Canonical grid digest for reproducibility checks.
//!
//! 32-bit FNV-1a over whole words: width, height, then per cell the alive
//! flag, age, the four gene values (zeros for dead cells) and the terrain
//! code. Each word is XORed in full before the multiply. Not a security
//! hash.

use crate::grid::Grid;

const FNV_OFFSET_BASIS: u32 = 0x811C_9DC5;
const FNV_PRIME: u32 = 0x0100_0193;

struct Fnv1a32(u32);

impl Fnv1a32 {
    fn new() -> Self {
        Self(FNV_OFFSET_BASIS)
    }

    #[inline]
    fn add(&mut self, word: u32) {
        self.0 ^= word;
        self.0 = self.0.wrapping_mul(FNV_PRIME);
    }
}

/// Digest of the full grid state
pub fn grid_digest(grid: &Grid) -> u32 {
    let mut hasher = Fnv1a32::new();
    hasher.add(grid.width() as u32);
    hasher.add(grid.height() as u32);

    for (cell, terrain) in grid.cells().iter().zip(grid.terrain()) {
        hasher.add(u32::from(cell.is_alive()));
        hasher.add(cell.age);
        for value in cell.gene_values() {
            hasher.add(u32::from(value));
        }
        hasher.add(terrain.code());
    }

    hasher.0
}

/// Digest as 8 zero-padded lowercase hex digits
pub fn hash_grid(grid: &Grid) -> String {
    format!("{:08x}", grid_digest(grid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::{Gene, GeneValue};
    use crate::grid::{Cell, Terrain};

    #[test]
    fn test_known_digests() {
        let mut grid = Grid::new(1, 1).unwrap();
        assert_eq!(hash_grid(&grid), "04fe202d");
        grid.set_cell(0, Cell::newborn(Gene::uniform(GeneValue::Ten)));
        assert_eq!(hash_grid(&grid), "e6927ffb");
    }

    #[test]
    fn test_sensitive_to_every_field() {
        let mut grid = Grid::new(3, 2).unwrap();
        grid.set_cell(2, Cell::newborn(Gene::uniform(GeneValue::Four)));
        let base = hash_grid(&grid);

        let mut aged = grid.clone();
        aged.set_cell(2, grid.cell(2).aged());
        assert_ne!(hash_grid(&aged), base);

        let mut terrain = grid.clone();
        terrain.set_terrain(0, Terrain::Half);
        assert_ne!(hash_grid(&terrain), base);

        let mut gene = grid.clone();
        gene.set_cell(2, Cell::newborn(Gene::uniform(GeneValue::Six)));
        assert_ne!(hash_grid(&gene), base);

        let transposed = Grid::new(2, 3).unwrap();
        assert_ne!(hash_grid(&transposed), hash_grid(&Grid::new(3, 2).unwrap()));
    }

    #[test]
    fn test_format_is_padded() {
        let grid = Grid::new(1, 1).unwrap();
        let hash = hash_grid(&grid);
        assert_eq!(hash.len(), 8);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
