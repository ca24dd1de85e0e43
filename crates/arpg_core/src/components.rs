//! Shared combat data types.
//!
//! Plain data with small helpers: identifiers, facing, health, and the
//! read-only target snapshots the hit resolver works on.

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, TileCoord, Vec2Fixed};

/// Unique identifier for entities.
pub type EntityId = u64;

// ============================================================================
// Facing
// ============================================================================

/// Cardinal facing of an actor.
///
/// Relative tile patterns are authored facing [`Facing::Up`] and rotated
/// clockwise (in screen space, +y down) to the actor's actual facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    /// Toward -y.
    Up,
    /// Toward +x.
    Right,
    /// Toward +y.
    #[default]
    Down,
    /// Toward -x.
    Left,
}

impl Facing {
    /// All facings in clockwise order starting from [`Facing::Up`].
    pub const ALL: [Facing; 4] = [Facing::Up, Facing::Right, Facing::Down, Facing::Left];

    /// Number of clockwise quarter turns from [`Facing::Up`].
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Facing::Up => 0,
            Facing::Right => 1,
            Facing::Down => 2,
            Facing::Left => 3,
        }
    }

    /// The facing a quarter turn clockwise from this one.
    #[must_use]
    pub const fn rotate_cw(self) -> Self {
        match self {
            Facing::Up => Facing::Right,
            Facing::Right => Facing::Down,
            Facing::Down => Facing::Left,
            Facing::Left => Facing::Up,
        }
    }

    /// The facing pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Facing::Up => Facing::Down,
            Facing::Right => Facing::Left,
            Facing::Down => Facing::Up,
            Facing::Left => Facing::Right,
        }
    }

    /// Unit tile step for this facing.
    #[must_use]
    pub const fn tile_delta(self) -> (i32, i32) {
        match self {
            Facing::Up => (0, -1),
            Facing::Right => (1, 0),
            Facing::Down => (0, 1),
            Facing::Left => (-1, 0),
        }
    }

    /// Unit vector for this facing in world space.
    #[must_use]
    pub fn unit_vector(self) -> Vec2Fixed {
        let (dx, dy) = self.tile_delta();
        Vec2Fixed::from_int(dx, dy)
    }

    /// Screen-space angle in radians (`atan2(dy, dx)` convention).
    #[must_use]
    pub fn angle(self) -> f64 {
        match self {
            Facing::Up => -std::f64::consts::FRAC_PI_2,
            Facing::Right => 0.0,
            Facing::Down => std::f64::consts::FRAC_PI_2,
            Facing::Left => std::f64::consts::PI,
        }
    }

    /// Facing for a unit tile step, if the step is cardinal.
    #[must_use]
    pub const fn from_delta(dx: i32, dy: i32) -> Option<Self> {
        match (dx, dy) {
            (0, -1) => Some(Facing::Up),
            (1, 0) => Some(Facing::Right),
            (0, 1) => Some(Facing::Down),
            (-1, 0) => Some(Facing::Left),
            _ => None,
        }
    }

    /// Facing that looks from `from` toward `to` along the dominant axis.
    ///
    /// Ties prefer the horizontal axis. Returns `None` when the points
    /// coincide.
    #[must_use]
    pub fn toward(from: Vec2Fixed, to: Vec2Fixed) -> Option<Self> {
        let diff = to - from;
        if diff == Vec2Fixed::ZERO {
            return None;
        }
        if diff.x.abs() >= diff.y.abs() {
            Some(if diff.x >= Fixed::ZERO {
                Facing::Right
            } else {
                Facing::Left
            })
        } else {
            Some(if diff.y > Fixed::ZERO {
                Facing::Down
            } else {
                Facing::Up
            })
        }
    }
}

// ============================================================================
// Factions and Targets
// ============================================================================

/// Which side of the fight an entity is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// The player character.
    Hero,
    /// Hostile agents.
    Monster,
}

impl Faction {
    /// The faction this one fights.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Faction::Hero => Faction::Monster,
            Faction::Monster => Faction::Hero,
        }
    }
}

/// Read-only snapshot of a potential target at the moment of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Entity behind this snapshot.
    pub id: EntityId,
    /// Side the entity fights on.
    pub faction: Faction,
    /// World position at snapshot time.
    pub position: Vec2Fixed,
    /// Whether the entity is currently active in the world.
    pub active: bool,
    /// Whether the entity still has health.
    pub alive: bool,
}

impl Target {
    /// Create an active, living target snapshot.
    #[must_use]
    pub const fn new(id: EntityId, faction: Faction, position: Vec2Fixed) -> Self {
        Self {
            id,
            faction,
            position,
            active: true,
            alive: true,
        }
    }

    /// Only active, living targets can be hit.
    #[must_use]
    pub const fn is_hittable(&self) -> bool {
        self.active && self.alive
    }

    /// Tile this target stands on.
    #[must_use]
    pub fn tile(&self, tile_size: Fixed) -> TileCoord {
        TileCoord::from_world(self.position, tile_size)
    }
}

// ============================================================================
// Health
// ============================================================================

/// Health component for damageable entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current health points.
    pub current: u32,
    /// Maximum health points.
    pub max: u32,
}

impl Health {
    /// Create health at full.
    #[must_use]
    pub const fn new(max: u32) -> Self {
        Self { current: max, max }
    }

    /// Subtract damage, saturating at zero.
    pub fn apply_damage(&mut self, amount: u32) {
        self.current = self.current.saturating_sub(amount);
    }

    /// Whether health has run out.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.current == 0
    }
}
