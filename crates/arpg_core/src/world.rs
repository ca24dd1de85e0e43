//! Boundary between the combat engine and the world that owns entities.
//!
//! The engine only reads the world through [`WorldQuery`] and
//! [`StatProvider`], and only writes to it through [`DamageSink`]. Target
//! rosters and collision layers stay owned by the host.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, Faction, Target};
use crate::damage::{Defense, StatBundle};
use crate::error::Result;
use crate::math::TileCoord;

/// Read-only queries against the host world.
pub trait WorldQuery {
    /// Living, active entities of `faction`.
    fn active_targets(&self, faction: Faction) -> Vec<Target>;

    /// Whether an agent may step onto `tile`: open terrain and not
    /// occupied by another agent.
    fn is_walkable(&self, tile: TileCoord) -> bool;
}

/// The single write path from the engine into entity health.
pub trait DamageSink {
    /// Subtract `amount` from `target`'s health.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::CombatError::EntityNotFound`] if `target` no
    /// longer exists.
    fn take_damage(&mut self, target: EntityId, amount: u32, is_magic: bool) -> Result<()>;
}

/// Snapshots of equipment and skill state.
pub trait StatProvider {
    /// Offensive stats of `actor`.
    fn attacker_stats(&self, actor: EntityId) -> Option<StatBundle>;

    /// Defensive side of `actor`.
    fn defender_stats(&self, actor: EntityId) -> Option<Defense>;

    /// Time between basic attacks of `actor`.
    fn attack_cooldown_ms(&self, actor: EntityId) -> Option<u64>;
}

/// Static terrain of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Floor.
    #[default]
    Open,
    /// Wall, water, or anything else that blocks movement.
    Blocked,
}

/// Static collision layer.
///
/// Cells outside the grid are blocked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionGrid {
    width: u32,
    height: u32,
    /// Row-major.
    cells: Vec<Cell>,
}

impl CollisionGrid {
    /// Create an all-open grid. Zero dimensions give an empty grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Open; width as usize * height as usize],
        }
    }

    /// Parse a grid from text rows, `#` for blocked and anything else open.
    ///
    /// Short rows are padded with open cells.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut grid = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                if ch == '#' {
                    grid.set(TileCoord::new(x as i32, y as i32), Cell::Blocked);
                }
            }
        }
        grid
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, tile: TileCoord) -> Option<usize> {
        let x = u32::try_from(tile.x).ok()?;
        let y = u32::try_from(tile.y).ok()?;
        (x < self.width && y < self.height).then(|| y as usize * self.width as usize + x as usize)
    }

    /// Whether `tile` lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, tile: TileCoord) -> bool {
        self.index(tile).is_some()
    }

    /// Cell at `tile`, `None` outside the grid.
    #[must_use]
    pub fn get(&self, tile: TileCoord) -> Option<Cell> {
        self.index(tile).map(|i| self.cells[i])
    }

    /// Set the cell at `tile`. Returns `false` outside the grid.
    pub fn set(&mut self, tile: TileCoord, cell: Cell) -> bool {
        match self.index(tile) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    /// Whether terrain at `tile` allows movement.
    #[must_use]
    pub fn is_open(&self, tile: TileCoord) -> bool {
        self.get(tile) == Some(Cell::Open)
    }
}
