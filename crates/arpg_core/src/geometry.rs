//! Geometric hit-detection primitives.
//!
//! Pure functions over tile patterns and world-space shapes. Nothing here
//! fails: degenerate input (zero-length segments, negative radii, NaN
//! angles) resolves to a sensible fallback or to "not inside".

use crate::components::Facing;
use crate::math::{wide_sqrt, wide_square, Fixed, TileCoord, Vec2Fixed, WideFixed};

/// A relative tile offset `(dx, dy)`.
pub type TileOffset = (i32, i32);

/// Rotate a pattern authored facing [`Facing::Up`] to `facing`.
///
/// Rotation is clockwise in screen space (+y down), one quarter turn per
/// step from `Up`:
///
/// ```text
/// Up:    ( dx,  dy)
/// Right: (-dy,  dx)
/// Down:  (-dx, -dy)
/// Left:  ( dy, -dx)
/// ```
///
/// With this convention a forward swing `[(-1,-1), (0,-1), (1,-1)]`
/// facing `Right` covers the column of tiles on the actor's right.
#[must_use]
pub fn rotate_pattern(pattern: &[TileOffset], facing: Facing) -> Vec<TileOffset> {
    pattern
        .iter()
        .map(|&offset| rotate_offset(offset, facing))
        .collect()
}

/// Rotate a single offset; see [`rotate_pattern`].
#[must_use]
pub const fn rotate_offset((dx, dy): TileOffset, facing: Facing) -> TileOffset {
    match facing {
        Facing::Up => (dx, dy),
        Facing::Right => (-dy, dx),
        Facing::Down => (-dx, -dy),
        Facing::Left => (dy, -dx),
    }
}

/// Absolute tiles covered by a pattern anchored at `anchor`.
#[must_use]
pub fn pattern_to_tiles(pattern: &[TileOffset], anchor: TileCoord) -> Vec<TileCoord> {
    pattern
        .iter()
        .map(|&(dx, dy)| anchor.offset(dx, dy))
        .collect()
}

/// World positions (tile centers) of a pattern anchored at `anchor`.
///
/// Each offset maps to `(anchor + offset) * tile_size + tile_size / 2`.
#[must_use]
pub fn pattern_to_world_positions(
    pattern: &[TileOffset],
    anchor: TileCoord,
    tile_size: Fixed,
) -> Vec<Vec2Fixed> {
    pattern_to_tiles(pattern, anchor)
        .into_iter()
        .map(|tile| tile.center(tile_size))
        .collect()
}

/// Whether `point` lies within `radius` of `center` (boundary inclusive).
///
/// A negative radius contains nothing; a zero radius contains only the
/// center itself.
#[must_use]
pub fn point_in_circle(point: Vec2Fixed, center: Vec2Fixed, radius: Fixed) -> bool {
    if radius < Fixed::ZERO {
        return false;
    }
    point.distance_squared(center) <= wide_square(radius)
}

/// Squared distance from `point` to the segment `start..end`.
///
/// The projection parameter is clamped to the segment. A zero-length
/// segment falls back to point distance.
#[must_use]
pub fn distance_squared_point_to_segment(
    point: Vec2Fixed,
    start: Vec2Fixed,
    end: Vec2Fixed,
) -> WideFixed {
    let seg = end - start;
    let len_sq = seg.length_squared();
    if len_sq == WideFixed::ZERO {
        return point.distance_squared(start);
    }

    let t = (point - start)
        .dot(seg)
        .saturating_div(len_sq)
        .clamp(WideFixed::ZERO, WideFixed::ONE);
    let closest = start + seg.scale(Fixed::saturating_from_num(t));
    point.distance_squared(closest)
}

/// Distance from `point` to the segment `start..end`.
#[must_use]
pub fn distance_point_to_segment(point: Vec2Fixed, start: Vec2Fixed, end: Vec2Fixed) -> Fixed {
    wide_sqrt(distance_squared_point_to_segment(point, start, end))
}

/// An annular sector: a radius band around `origin` limited to an arc
/// centred on a facing direction.
///
/// Trigonometry is evaluated once on construction; [`Sector::contains`]
/// is fixed-point only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sector {
    origin: Vec2Fixed,
    /// Unit vector of the facing direction.
    direction: Vec2Fixed,
    /// `cos(arc / 2)`; ignored when `full_circle` is set.
    half_arc_cos: Fixed,
    full_circle: bool,
    min_radius: Fixed,
    max_radius: Fixed,
    valid: bool,
}

impl Sector {
    /// Build a sector from a facing angle and arc width, both in radians.
    ///
    /// Non-finite angles produce a sector that contains nothing.
    #[must_use]
    pub fn new(
        origin: Vec2Fixed,
        facing_angle: f64,
        arc_angle: f64,
        min_radius: Fixed,
        max_radius: Fixed,
    ) -> Self {
        if !facing_angle.is_finite() || !arc_angle.is_finite() {
            return Self {
                origin,
                direction: Vec2Fixed::ZERO,
                half_arc_cos: Fixed::ONE,
                full_circle: false,
                min_radius,
                max_radius,
                valid: false,
            };
        }
        let direction = Vec2Fixed::new(
            Fixed::from_num(facing_angle.cos()),
            Fixed::from_num(facing_angle.sin()),
        );
        Self::with_direction(origin, direction, arc_angle, min_radius, max_radius)
    }

    /// Build a sector looking along a cardinal facing.
    ///
    /// Uses the exact facing unit vector rather than evaluating its angle.
    #[must_use]
    pub fn facing(
        origin: Vec2Fixed,
        facing: Facing,
        arc_angle: f64,
        min_radius: Fixed,
        max_radius: Fixed,
    ) -> Self {
        Self::with_direction(origin, facing.unit_vector(), arc_angle, min_radius, max_radius)
    }

    fn with_direction(
        origin: Vec2Fixed,
        direction: Vec2Fixed,
        arc_angle: f64,
        min_radius: Fixed,
        max_radius: Fixed,
    ) -> Self {
        let valid = arc_angle.is_finite() && arc_angle >= 0.0;
        let half_arc = if valid { arc_angle / 2.0 } else { 0.0 };
        let full_circle = half_arc >= std::f64::consts::PI;
        Self {
            origin,
            direction,
            half_arc_cos: Fixed::from_num(half_arc.min(std::f64::consts::PI).cos()),
            full_circle,
            min_radius,
            max_radius,
            valid,
        }
    }

    /// Origin of the sector.
    #[must_use]
    pub const fn origin(&self) -> Vec2Fixed {
        self.origin
    }

    /// Same sector with a different radius band (used by expanding waves).
    #[must_use]
    pub const fn with_radii(mut self, min_radius: Fixed, max_radius: Fixed) -> Self {
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self
    }

    /// Whether `point` lies inside the sector.
    ///
    /// Accepted when `min_radius <= |point - origin| <= max_radius` and the
    /// angle between the offset and the facing is at most half the arc.
    /// The origin itself is inside only if `min_radius` is zero.
    #[must_use]
    pub fn contains(&self, point: Vec2Fixed) -> bool {
        if !self.valid || self.max_radius < self.min_radius || self.max_radius < Fixed::ZERO {
            return false;
        }

        let offset = point - self.origin;
        let dist_sq = offset.length_squared();
        let min_sq = if self.min_radius > Fixed::ZERO {
            wide_square(self.min_radius)
        } else {
            WideFixed::ZERO
        };
        if dist_sq < min_sq || dist_sq > wide_square(self.max_radius) {
            return false;
        }
        if dist_sq == WideFixed::ZERO || self.full_circle {
            return true;
        }

        // dot >= |offset| * cos(half_arc), compared in squared form
        let dot = offset.dot(self.direction);
        let bound_sq = dist_sq.saturating_mul(wide_square(self.half_arc_cos));
        let dot_sq = dot.saturating_mul(dot);
        if self.half_arc_cos >= Fixed::ZERO {
            dot >= WideFixed::ZERO && dot_sq >= bound_sq
        } else {
            dot >= WideFixed::ZERO || dot_sq <= bound_sq
        }
    }
}

/// Whether `point` lies inside `sector`.
#[must_use]
pub fn point_in_sector(point: Vec2Fixed, sector: &Sector) -> bool {
    sector.contains(point)
}
