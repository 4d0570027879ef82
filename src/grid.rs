//! Torus grid, cells, terrain and neighbor topology.

use crate::gene::Gene;
use crate::rng::unit;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The eight neighbor directions, in canonical order.
///
/// Influence propagation and parent candidate order both follow this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    /// (dx, dy) step; y grows downward
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }

    #[inline]
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::UpLeft => Direction::DownRight,
            Direction::UpRight => Direction::DownLeft,
            Direction::DownLeft => Direction::UpRight,
            Direction::DownRight => Direction::UpLeft,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Per-cell multiplier on outgoing influence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Terrain {
    #[default]
    Normal,
    Double,
    Half,
}

impl Terrain {
    pub const ALL: [Terrain; 3] = [Terrain::Normal, Terrain::Double, Terrain::Half];

    #[inline]
    pub fn multiplier(self) -> f64 {
        match self {
            Terrain::Normal => 1.0,
            Terrain::Double => 2.0,
            Terrain::Half => 0.5,
        }
    }

    /// Stable code folded into the grid hash
    #[inline]
    pub fn code(self) -> u32 {
        match self {
            Terrain::Normal => 0,
            Terrain::Double => 1,
            Terrain::Half => 2,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self.code() as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Terrain::Normal => "normal",
            Terrain::Double => "double",
            Terrain::Half => "half",
        }
    }

    /// Display character for text rendering
    pub fn char(self) -> char {
        match self {
            Terrain::Normal => '.',
            Terrain::Double => '+',
            Terrain::Half => '-',
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Terrain {
    type Err = UnknownTerrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Terrain::Normal),
            "double" => Ok(Terrain::Double),
            "half" => Ok(Terrain::Half),
            other => Err(UnknownTerrain(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown terrain type {0:?}")]
pub struct UnknownTerrain(pub String);

/// A single grid cell. `gene` is `Some` exactly when the cell is alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub gene: Option<Gene>,
    pub age: u32,
}

impl Cell {
    /// Dead placeholder: no gene, age 0
    pub const DEAD: Cell = Cell { gene: None, age: 0 };

    pub fn alive(gene: Gene, age: u32) -> Self {
        Self { gene: Some(gene), age }
    }

    /// Freshly born cell (age 1)
    pub fn newborn(gene: Gene) -> Self {
        Self::alive(gene, 1)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.gene.is_some()
    }

    /// The same cell one tick older
    #[inline]
    pub fn aged(self) -> Self {
        Self {
            age: self.age.saturating_add(1),
            ..self
        }
    }

    /// Gene values as written to persisted data and the hash
    pub fn gene_values(&self) -> [u8; 4] {
        self.gene.map_or(Gene::PLACEHOLDER, |g| g.values())
    }
}

/// Largest grid accepted anywhere (4096 x 4096)
pub const MAX_CELLS: usize = 1 << 24;

/// Grid construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },
    #[error("grid dimensions {width}x{height} exceed the {MAX_CELLS} cell limit")]
    TooLarge { width: usize, height: usize },
    #[error("a {width}x{height} grid needs {expected} cells, got {found}")]
    CellCount {
        width: usize,
        height: usize,
        expected: usize,
        found: usize,
    },
    #[error("terrain length {found} does not match cell count {expected}")]
    TerrainCount { expected: usize, found: usize },
}

/// Raw grid fields, validated into a [`Grid`] on deserialization
#[derive(Clone, Debug, Deserialize)]
struct GridParts {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    terrain: Vec<Terrain>,
}

impl TryFrom<GridParts> for Grid {
    type Error = GridError;

    fn try_from(parts: GridParts) -> Result<Self, Self::Error> {
        Grid::from_parts(parts.width, parts.height, parts.cells, parts.terrain)
    }
}

/// Row-major torus grid. Always holds `width * height` cells and terrain
/// entries; every constructor checks this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridParts")]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    terrain: Vec<Terrain>,
}

impl Grid {
    /// All-dead grid on normal terrain
    pub fn new(width: usize, height: usize) -> Result<Self, GridError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            cells: vec![Cell::DEAD; len],
            terrain: vec![Terrain::Normal; len],
        })
    }

    /// Assemble a grid from its parts, checking every length invariant
    pub fn from_parts(
        width: usize,
        height: usize,
        cells: Vec<Cell>,
        terrain: Vec<Terrain>,
    ) -> Result<Self, GridError> {
        let expected = checked_len(width, height)?;
        if cells.len() != expected {
            return Err(GridError::CellCount {
                width,
                height,
                expected,
                found: cells.len(),
            });
        }
        if terrain.len() != expected {
            return Err(GridError::TerrainCount {
                expected,
                found: terrain.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
            terrain,
        })
    }

    /// Replace the terrain layer
    pub fn with_terrain(mut self, terrain: Vec<Terrain>) -> Result<Self, GridError> {
        if terrain.len() != self.cells.len() {
            return Err(GridError::TerrainCount {
                expected: self.cells.len(),
                found: terrain.len(),
            });
        }
        self.terrain = terrain;
        Ok(self)
    }

    /// Same dimensions and terrain, new cells. Used to commit a tick.
    pub(crate) fn with_cells(&self, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), self.cells.len());
        Self {
            width: self.width,
            height: self.height,
            cells,
            terrain: self.terrain.clone(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false for a constructed grid; provided for API symmetry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn terrain(&self) -> &[Terrain] {
        &self.terrain
    }

    #[inline]
    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    #[inline]
    pub fn terrain_at(&self, index: usize) -> Terrain {
        self.terrain[index]
    }

    pub fn set_cell(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    pub fn set_terrain(&mut self, index: usize, terrain: Terrain) {
        self.terrain[index] = terrain;
    }

    /// Row-major index of (x, y)
    #[inline]
    pub fn index_of(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Neighbor of `index` one step in `direction`, wrapping at the edges
    #[inline]
    pub fn neighbor(&self, index: usize, direction: Direction) -> usize {
        let (dx, dy) = direction.offset();
        neighbor_index(index, dx, dy, self.width, self.height)
    }

    /// All eight neighbors in canonical direction order.
    ///
    /// On small grids the same index can appear several times (a 1x1 grid
    /// is its own neighbor in every direction).
    pub fn neighbor_indices(&self, index: usize) -> [usize; 8] {
        Direction::ALL.map(|direction| self.neighbor(index, direction))
    }

    pub fn has_alive_neighbor(&self, index: usize) -> bool {
        Direction::ALL
            .iter()
            .any(|&direction| self.cells[self.neighbor(index, direction)].is_alive())
    }

    /// Live neighbor indices in canonical direction order
    pub fn alive_neighbors(&self, index: usize) -> Vec<usize> {
        self.neighbor_indices(index)
            .into_iter()
            .filter(|&n| self.cells[n].is_alive())
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_alive()).count()
    }

    /// Cell count per terrain class, indexed by [`Terrain::index`]
    pub fn terrain_counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for terrain in &self.terrain {
            counts[terrain.index()] += 1;
        }
        counts
    }

    /// Text rendering: `#` for live cells, the terrain character otherwise
    pub fn render_ascii(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for y in 0..self.height {
            for x in 0..self.width {
                let i = self.index_of(x, y);
                if self.cells[i].is_alive() {
                    out.push('#');
                } else {
                    out.push(self.terrain[i].char());
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Cell count of a `width` x `height` grid, checked against [`MAX_CELLS`]
pub fn checked_len(width: usize, height: usize) -> Result<usize, GridError> {
    if width == 0 || height == 0 {
        return Err(GridError::EmptyDimensions { width, height });
    }
    width
        .checked_mul(height)
        .filter(|&len| len <= MAX_CELLS)
        .ok_or(GridError::TooLarge { width, height })
}

/// Torus neighbor of a row-major index: `(coord + delta) mod dimension` on
/// each axis.
#[inline]
pub fn neighbor_index(index: usize, dx: i64, dy: i64, width: usize, height: usize) -> usize {
    let x = (index % width) as i64;
    let y = (index / width) as i64;
    let nx = (x + dx).rem_euclid(width as i64) as usize;
    let ny = (y + dy).rem_euclid(height as i64) as usize;
    ny * width + nx
}

/// Random initial grid on normal terrain.
///
/// Cells are visited in index order: one draw decides `draw < density`, and
/// a live cell then takes four more draws for its gene and starts at age 1.
pub fn create_grid<R: RngCore + ?Sized>(
    width: usize,
    height: usize,
    density: f64,
    rng: &mut R,
) -> Result<Grid, GridError> {
    let mut grid = Grid::new(width, height)?;
    for cell in grid.cells.iter_mut() {
        if unit(rng) < density {
            *cell = Cell::newborn(Gene::random(rng));
        }
    }
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gene::GeneValue;
    use crate::rng::Mulberry32;

    fn live() -> Cell {
        Cell::newborn(Gene::uniform(GeneValue::Four))
    }

    #[test]
    fn test_neighbor_wraps() {
        // 4x3 grid, corner (0, 0)
        assert_eq!(neighbor_index(0, -1, 0, 4, 3), 3);
        assert_eq!(neighbor_index(0, 0, -1, 4, 3), 8);
        assert_eq!(neighbor_index(0, -1, -1, 4, 3), 11);
        assert_eq!(neighbor_index(11, 1, 1, 4, 3), 0);
        assert_eq!(neighbor_index(5, 1, 0, 4, 3), 6);
    }

    #[test]
    fn test_neighbor_order() {
        let grid = Grid::new(3, 3).unwrap();
        // Center cell (1, 1) = 4
        assert_eq!(grid.neighbor_indices(4), [1, 7, 3, 5, 0, 2, 6, 8]);
    }

    #[test]
    fn test_single_cell_is_own_neighbor() {
        let grid = Grid::new(1, 1).unwrap();
        assert_eq!(grid.neighbor_indices(0), [0; 8]);
    }

    #[test]
    fn test_opposites() {
        for direction in Direction::ALL {
            assert_eq!(direction.opposite().opposite(), direction);
            let (dx, dy) = direction.offset();
            let (ox, oy) = direction.opposite().offset();
            assert_eq!((dx + ox, dy + oy), (0, 0));
        }
    }

    #[test]
    fn test_alive_neighbors() {
        let mut grid = Grid::new(3, 3).unwrap();
        assert!(!grid.has_alive_neighbor(4));
        grid.set_cell(2, live());
        grid.set_cell(1, live());
        assert!(grid.has_alive_neighbor(4));
        // Canonical order: UP (1) before UP_RIGHT (2)
        assert_eq!(grid.alive_neighbors(4), vec![1, 2]);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(matches!(Grid::new(0, 5), Err(GridError::EmptyDimensions { .. })));
        assert!(matches!(
            Grid::from_parts(2, 2, vec![Cell::DEAD; 3], vec![Terrain::Normal; 4]),
            Err(GridError::CellCount { expected: 4, found: 3, .. })
        ));
        assert!(matches!(
            Grid::from_parts(2, 2, vec![Cell::DEAD; 4], vec![Terrain::Normal; 5]),
            Err(GridError::TerrainCount { expected: 4, found: 5 })
        ));
    }

    #[test]
    fn test_rejects_oversized_grid() {
        assert!(matches!(
            Grid::new(1_000_000, 1_000_000),
            Err(GridError::TooLarge { width: 1_000_000, height: 1_000_000 })
        ));
        assert!(matches!(Grid::new(usize::MAX, 2), Err(GridError::TooLarge { .. })));
        assert_eq!(checked_len(4096, 4096), Ok(MAX_CELLS));
        assert!(checked_len(4097, 4096).is_err());

        let mut rng = Mulberry32::new(1);
        assert!(create_grid(1_000_000, 1_000_000, 0.25, &mut rng).is_err());
    }

    #[test]
    fn test_create_grid_density() {
        let mut rng = Mulberry32::new(12345);
        let grid = create_grid(10, 10, 0.25, &mut rng).unwrap();
        assert_eq!(grid.alive_count(), 26);
        for cell in grid.cells() {
            if cell.is_alive() {
                assert_eq!(cell.age, 1);
            } else {
                assert_eq!(*cell, Cell::DEAD);
            }
        }
        assert!(grid.terrain().iter().all(|&t| t == Terrain::Normal));

        let empty = create_grid(5, 5, 0.0, &mut rng).unwrap();
        assert_eq!(empty.alive_count(), 0);
        let full = create_grid(5, 5, 1.0, &mut rng).unwrap();
        assert_eq!(full.alive_count(), 25);
    }

    #[test]
    fn test_terrain_parse() {
        assert_eq!("double".parse::<Terrain>(), Ok(Terrain::Double));
        assert!("swamp".parse::<Terrain>().is_err());
        assert_eq!(Terrain::Half.multiplier(), 0.5);
    }

    #[test]
    fn test_deserialize_validates_lengths() {
        let grid = Grid::new(2, 2).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        let back: Grid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);

        let broken = json.replacen("\"width\":2", "\"width\":3", 1);
        assert!(serde_json::from_str::<Grid>(&broken).is_err());
    }

    #[test]
    fn test_render_ascii() {
        let mut grid = Grid::new(2, 1).unwrap();
        grid.set_cell(0, live());
        grid.set_terrain(1, Terrain::Half);
        assert_eq!(grid.render_ascii(), "#-\n");
    }
}
