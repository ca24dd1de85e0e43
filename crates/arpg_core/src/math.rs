//! Fixed-point math and tile-grid coordinates.
//!
//! World positions use fixed-point arithmetic so that hit tests and
//! distance checks give identical answers on every platform. The tile
//! grid is integral; world positions convert to tiles by flooring, and
//! tiles convert back to world space at their centers.

use fixed::types::{I32F32, I64F64};
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all world-space math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Wide fixed-point type for squared distances and dot products.
///
/// Products of two world coordinates do not fit in [`Fixed`] once
/// distances pass about 46 000 units. Squaring in this type keeps every
/// comparison exact for any pair of positions on the map.
pub type WideFixed = I64F64;

/// Widen a [`Fixed`] value without loss.
#[must_use]
pub fn widen(value: Fixed) -> WideFixed {
    WideFixed::from_num(value)
}

/// `value * value` in the wide type.
#[must_use]
pub fn wide_square(value: Fixed) -> WideFixed {
    let wide = widen(value);
    wide.saturating_mul(wide)
}

/// Fixed-point 2D vector in world space (+x right, +y down).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer world coordinates.
    #[must_use]
    pub fn from_int(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> WideFixed {
        let dx = widen(self.x) - widen(other.x);
        let dy = widen(self.y) - widen(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance, saturating at [`Fixed::MAX`].
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        wide_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> WideFixed {
        let x = widen(self.x).saturating_mul(widen(other.x));
        let y = widen(self.y).saturating_mul(widen(other.y));
        x.saturating_add(y)
    }

    /// Squared length of the vector.
    #[must_use]
    pub fn length_squared(self) -> WideFixed {
        self.dot(self)
    }

    /// Scale both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    wide_sqrt(widen(value))
}

/// Square root of a wide value, narrowed back to [`Fixed`] (saturating).
#[must_use]
pub fn wide_sqrt(value: WideFixed) -> Fixed {
    if value <= WideFixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = WideFixed::ZERO;
    let mut high = value.max(WideFixed::ONE);

    for _ in 0..128 {
        let mid = low + (high - low) / 2;
        if mid == low {
            break;
        }
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    Fixed::saturating_from_num(low)
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// Integer coordinate of a cell on the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Tile containing a world position: `floor(world / tile_size)` per axis.
    ///
    /// A non-positive tile size maps everything to the origin tile.
    #[must_use]
    pub fn from_world(pos: Vec2Fixed, tile_size: Fixed) -> Self {
        if tile_size <= Fixed::ZERO {
            return Self::default();
        }
        Self {
            x: (pos.x / tile_size).floor().to_num::<i32>(),
            y: (pos.y / tile_size).floor().to_num::<i32>(),
        }
    }

    /// World position of this tile's center, the canonical grid anchor.
    #[must_use]
    pub fn center(self, tile_size: Fixed) -> Vec2Fixed {
        let half = tile_size / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(self.x) * tile_size + half,
            Fixed::from_num(self.y) * tile_size + half,
        )
    }

    /// Tile offset by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Chebyshev (king-move) distance in tiles.
    #[must_use]
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        self.x.abs_diff(other.x).max(self.y.abs_diff(other.y))
    }
}
