//! Form genes: four directional influence strengths per live cell.

use crate::rng::unit;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One locus value. The domain is exactly {2, 4, 6, 8, 10}.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum GeneValue {
    Two = 2,
    Four = 4,
    Six = 6,
    Eight = 8,
    Ten = 10,
}

impl GeneValue {
    /// Domain in ascending order. Random draws index into this table.
    pub const ALL: [GeneValue; 5] = [
        GeneValue::Two,
        GeneValue::Four,
        GeneValue::Six,
        GeneValue::Eight,
        GeneValue::Ten,
    ];

    #[inline]
    pub fn value(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.value())
    }

    /// Position within [`GeneValue::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        (self.value() / 2 - 1) as usize
    }

    /// Uniform draw from the domain (consumes one draw)
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let slot = (unit(rng) * Self::ALL.len() as f64).floor() as usize;
        Self::ALL[slot.min(Self::ALL.len() - 1)]
    }
}

impl From<GeneValue> for u8 {
    fn from(value: GeneValue) -> Self {
        value.value()
    }
}

impl TryFrom<u8> for GeneValue {
    type Error = InvalidGeneValue;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(GeneValue::Two),
            4 => Ok(GeneValue::Four),
            6 => Ok(GeneValue::Six),
            8 => Ok(GeneValue::Eight),
            10 => Ok(GeneValue::Ten),
            other => Err(InvalidGeneValue(f64::from(other))),
        }
    }
}

impl TryFrom<f64> for GeneValue {
    type Error = InvalidGeneValue;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || !(2.0..=10.0).contains(&value) {
            return Err(InvalidGeneValue(value));
        }
        GeneValue::try_from(value as u8).map_err(|_| InvalidGeneValue(value))
    }
}

impl fmt::Display for GeneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Value outside the gene domain
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("gene value {0} is outside the domain {{2, 4, 6, 8, 10}}")]
pub struct InvalidGeneValue(pub f64);

/// Gene loci in storage order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locus {
    Up,
    Down,
    Left,
    Right,
}

impl Locus {
    pub const ALL: [Locus; 4] = [Locus::Up, Locus::Down, Locus::Left, Locus::Right];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Ordered (Up, Down, Left, Right) tuple carried by a live cell.
///
/// Dead cells carry no gene at all; the `(0, 0, 0, 0)` placeholder only
/// exists in persisted data and in the grid hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gene(pub [GeneValue; 4]);

impl Gene {
    /// Placeholder values written for dead cells
    pub const PLACEHOLDER: [u8; 4] = [0; 4];

    pub fn new(up: GeneValue, down: GeneValue, left: GeneValue, right: GeneValue) -> Self {
        Self([up, down, left, right])
    }

    /// Same value at every locus
    pub fn uniform(value: GeneValue) -> Self {
        Self([value; 4])
    }

    /// Build from raw integers, rejecting anything outside the domain
    pub fn from_values(values: [u8; 4]) -> Result<Self, InvalidGeneValue> {
        Ok(Self([
            GeneValue::try_from(values[0])?,
            GeneValue::try_from(values[1])?,
            GeneValue::try_from(values[2])?,
            GeneValue::try_from(values[3])?,
        ]))
    }

    /// Four independent uniform draws, Up first
    pub fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let up = GeneValue::random(rng);
        let down = GeneValue::random(rng);
        let left = GeneValue::random(rng);
        let right = GeneValue::random(rng);
        Self::new(up, down, left, right)
    }

    #[inline]
    pub fn get(&self, locus: Locus) -> GeneValue {
        self.0[locus.index()]
    }

    #[inline]
    pub fn set(&mut self, locus: Locus, value: GeneValue) {
        self.0[locus.index()] = value;
    }

    pub fn values(&self) -> [u8; 4] {
        self.0.map(GeneValue::value)
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [u, d, l, r] = self.0;
        write!(f, "({}, {}, {}, {})", u, d, l, r)
    }
}
