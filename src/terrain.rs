//! Seeded terrain layouts.
//!
//! A layout is an independent random scatter of `double` and `half` cells by
//! configured fractions, optionally followed by a clustering pass in which
//! cells copy a random orthogonal neighbor from the scattered snapshot.

use crate::grid::{neighbor_index, Direction, Terrain};
use crate::rng::unit;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Terrain layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Fraction of cells with doubled outgoing influence
    pub double_fraction: f64,
    /// Fraction of cells with halved outgoing influence
    pub half_fraction: f64,
    /// Probability that a cell copies a neighbor during the clustering pass
    #[serde(default)]
    pub clustering: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            double_fraction: 0.0,
            half_fraction: 0.0,
            clustering: 0.0,
        }
    }
}

impl TerrainConfig {
    /// True when the layout is all `normal` and generation draws nothing
    pub fn is_uniform(&self) -> bool {
        self.double_fraction <= 0.0 && self.half_fraction <= 0.0
    }

    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("double_fraction", self.double_fraction),
            ("half_fraction", self.half_fraction),
            ("clustering", self.clustering),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("terrain.{} must be between 0 and 1", name));
            }
        }
        if self.double_fraction + self.half_fraction > 1.0 {
            return Err("terrain fractions must sum to at most 1".to_string());
        }
        Ok(())
    }
}

/// Generate a row-major terrain layer for a `width x height` torus.
///
/// Uniform configs return all `normal` without touching the generator.
pub fn generate_terrain<R: RngCore + ?Sized>(
    width: usize,
    height: usize,
    config: &TerrainConfig,
    rng: &mut R,
) -> Vec<Terrain> {
    let len = width * height;
    if config.is_uniform() {
        return vec![Terrain::Normal; len];
    }

    let scattered: Vec<Terrain> = (0..len)
        .map(|_| {
            let roll = unit(rng);
            if roll < config.double_fraction {
                Terrain::Double
            } else if roll < config.double_fraction + config.half_fraction {
                Terrain::Half
            } else {
                Terrain::Normal
            }
        })
        .collect();

    if config.clustering <= 0.0 {
        return scattered;
    }

    const ORTHOGONAL: [Direction; 4] =
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    let mut clustered = scattered.clone();
    for (i, slot) in clustered.iter_mut().enumerate() {
        if unit(rng) < config.clustering {
            let pick = ((unit(rng) * 4.0).floor() as usize).min(3);
            let (dx, dy) = ORTHOGONAL[pick].offset();
            *slot = scattered[neighbor_index(i, dx, dy, width, height)];
        }
    }
    clustered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Mulberry32;

    #[test]
    fn test_uniform_draws_nothing() {
        let mut rng = Mulberry32::new(9);
        let layout = generate_terrain(8, 8, &TerrainConfig::default(), &mut rng);
        assert!(layout.iter().all(|&t| t == Terrain::Normal));
        assert_eq!(rng.state(), 9);
    }

    #[test]
    fn test_fractions_roughly_respected() {
        let config = TerrainConfig {
            double_fraction: 0.3,
            half_fraction: 0.2,
            clustering: 0.0,
        };
        let mut rng = Mulberry32::new(21);
        let layout = generate_terrain(100, 100, &config, &mut rng);
        let doubles = layout.iter().filter(|&&t| t == Terrain::Double).count() as f64;
        let halves = layout.iter().filter(|&&t| t == Terrain::Half).count() as f64;
        assert!((doubles / 10_000.0 - 0.3).abs() < 0.03);
        assert!((halves / 10_000.0 - 0.2).abs() < 0.03);
    }

    #[test]
    fn test_full_clustering_copies_neighbors() {
        let config = TerrainConfig {
            double_fraction: 0.5,
            half_fraction: 0.0,
            clustering: 1.0,
        };
        let mut rng = Mulberry32::new(4);
        let layout = generate_terrain(6, 6, &config, &mut rng);
        assert_eq!(layout.len(), 36);
        assert!(layout.iter().all(|&t| t != Terrain::Half));
    }

    #[test]
    fn test_same_seed_same_layout() {
        let config = TerrainConfig {
            double_fraction: 0.2,
            half_fraction: 0.2,
            clustering: 0.5,
        };
        let a = generate_terrain(12, 9, &config, &mut Mulberry32::new(5));
        let b = generate_terrain(12, 9, &config, &mut Mulberry32::new(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_validate() {
        assert!(TerrainConfig::default().validate().is_ok());
        let bad = TerrainConfig {
            double_fraction: 0.7,
            half_fraction: 0.5,
            clustering: 0.0,
        };
        assert!(bad.validate().is_err());
    }
}
