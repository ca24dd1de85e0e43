//! Hit resolution against a snapshot of live targets.
//!
//! Each resolver takes a shape and a target roster and returns the subset
//! that is hit. Resolvers never touch target health. The only side effect
//! any of them has is recording newly struck targets in a [`HitTracker`],
//! and that is explicit in their signatures.
//!
//! Inactive or dead targets are never hit; an empty roster yields an empty
//! hit set.

use std::collections::BTreeSet;

use crate::components::{EntityId, Facing, Target};
use crate::geometry::{distance_squared_point_to_segment, point_in_circle, Sector};
use crate::math::{wide_square, Fixed, TileCoord, Vec2Fixed, WideFixed};

/// Collision radius of a target body, added to line half-widths.
pub const TARGET_RADIUS: Fixed = Fixed::const_from_int(16);

/// Targets already struck by one ability activation.
///
/// Lives exactly as long as the activation that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitTracker {
    struck: BTreeSet<EntityId>,
}

impl HitTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has already been struck.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.struck.contains(&id)
    }

    /// Record a strike. Returns `false` if `id` was already recorded.
    pub fn record(&mut self, id: EntityId) -> bool {
        self.struck.insert(id)
    }

    /// Number of distinct targets struck.
    #[must_use]
    pub fn len(&self) -> usize {
        self.struck.len()
    }

    /// Whether nothing has been struck yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.struck.is_empty()
    }

    /// Struck ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.struck.iter().copied()
    }
}

/// Targets standing on any of `candidate_tiles`.
///
/// A target counts once even if several candidates name its tile.
#[must_use]
pub fn targets_in_tiles(
    candidate_tiles: &[TileCoord],
    targets: &[Target],
    tile_size: Fixed,
) -> Vec<Target> {
    targets
        .iter()
        .filter(|t| t.is_hittable())
        .filter(|t| {
            let tile = t.tile(tile_size);
            candidate_tiles.iter().any(|&c| c == tile)
        })
        .copied()
        .collect()
}

/// Targets within `radius` of `center`, boundary inclusive.
///
/// `exclude` skips one target, typically the one an explosion's projectile
/// already struck directly.
#[must_use]
pub fn targets_in_circle(
    center: Vec2Fixed,
    radius: Fixed,
    targets: &[Target],
    exclude: Option<EntityId>,
) -> Vec<Target> {
    targets
        .iter()
        .filter(|t| t.is_hittable() && Some(t.id) != exclude)
        .filter(|t| point_in_circle(t.position, center, radius))
        .copied()
        .collect()
}

/// Targets whose body touches the segment `start..end` widened by `half_width`.
///
/// A target is hit when its distance to the segment is at most
/// `half_width + TARGET_RADIUS`. Targets already in `already_hit` are
/// skipped; newly hit targets are added to it.
pub fn targets_in_line(
    start: Vec2Fixed,
    end: Vec2Fixed,
    half_width: Fixed,
    targets: &[Target],
    already_hit: &mut HitTracker,
) -> Vec<Target> {
    let reach = half_width.saturating_add(TARGET_RADIUS).max(Fixed::ZERO);
    let reach_sq = wide_square(reach);

    let mut hits = Vec::new();
    for target in targets.iter().filter(|t| t.is_hittable()) {
        if already_hit.contains(target.id) {
            continue;
        }
        if distance_squared_point_to_segment(target.position, start, end) <= reach_sq {
            already_hit.record(target.id);
            hits.push(*target);
        }
    }
    hits
}

/// Targets inside `sector` not yet struck, recording the new ones.
///
/// Called once per expansion step of a travelling wave, with the band of
/// the sector advanced each time.
pub fn targets_in_sector(
    sector: &Sector,
    targets: &[Target],
    already_hit: &mut HitTracker,
) -> Vec<Target> {
    let mut hits = Vec::new();
    for target in targets.iter().filter(|t| t.is_hittable()) {
        if already_hit.contains(target.id) {
            continue;
        }
        if sector.contains(target.position) {
            already_hit.record(target.id);
            hits.push(*target);
        }
    }
    hits
}

/// Targets in the half-plane in front of `origin` along `facing`.
///
/// The once-per-cast pre-filter for cone and wave abilities; targets level
/// with the origin count as in front.
#[must_use]
pub fn forward_half_space(origin: Vec2Fixed, facing: Facing, targets: &[Target]) -> Vec<Target> {
    let forward = facing.unit_vector();
    targets
        .iter()
        .filter(|t| t.is_hittable())
        .filter(|t| (t.position - origin).dot(forward) >= WideFixed::ZERO)
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Faction;
    use std::f64::consts::FRAC_PI_2;

    fn fixed(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    fn target(id: EntityId, x: i32, y: i32) -> Target {
        Target::new(id, Faction::Monster, Vec2Fixed::from_int(x, y))
    }

    fn ids(hits: &[Target]) -> Vec<EntityId> {
        hits.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_tiles_match_floor_of_position() {
        let targets = [target(1, 40, 40), target(2, 100, 40), target(3, 63, 63)];
        let tiles = [TileCoord::new(1, 1), TileCoord::new(1, 1)];
        let hits = targets_in_tiles(&tiles, &targets, fixed(32));
        assert_eq!(ids(&hits), vec![1, 3]);
    }

    #[test]
    fn test_tiles_skip_dead_and_inactive() {
        let mut dead = target(1, 40, 40);
        dead.alive = false;
        let mut hidden = target(2, 40, 40);
        hidden.active = false;
        let hits = targets_in_tiles(&[TileCoord::new(1, 1)], &[dead, hidden], fixed(32));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_empty_roster_is_empty_hit_set() {
        let mut tracker = HitTracker::new();
        assert!(targets_in_tiles(&[TileCoord::new(0, 0)], &[], fixed(32)).is_empty());
        assert!(targets_in_circle(Vec2Fixed::ZERO, fixed(10), &[], None).is_empty());
        assert!(targets_in_line(Vec2Fixed::ZERO, Vec2Fixed::from_int(10, 0), fixed(4), &[], &mut tracker).is_empty());
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_circle_boundary_inclusive() {
        let targets = [target(1, 30, 40), target(2, 30, 41)];
        let hits = targets_in_circle(Vec2Fixed::ZERO, fixed(50), &targets, None);
        assert_eq!(ids(&hits), vec![1]);
    }

    #[test]
    fn test_circle_excludes_direct_hit() {
        let targets = [target(1, 0, 0), target(2, 10, 0)];
        let hits = targets_in_circle(Vec2Fixed::ZERO, fixed(20), &targets, Some(1));
        assert_eq!(ids(&hits), vec![2]);
    }

    #[test]
    fn test_line_reach_includes_target_radius() {
        let start = Vec2Fixed::ZERO;
        let end = Vec2Fixed::from_int(100, 0);
        // half width 4 + radius 16 = 20
        let targets = [target(1, 50, 20), target(2, 50, 21), target(3, 120, 0)];
        let mut tracker = HitTracker::new();
        let hits = targets_in_line(start, end, fixed(4), &targets, &mut tracker);
        assert_eq!(ids(&hits), vec![1, 3]);
        assert!(tracker.contains(1));
        assert!(tracker.contains(3));
        assert!(!tracker.contains(2));
    }

    #[test]
    fn test_line_does_not_double_hit() {
        let start = Vec2Fixed::ZERO;
        let end = Vec2Fixed::from_int(100, 0);
        let targets = [target(1, 50, 0)];
        let mut tracker = HitTracker::new();

        let first = targets_in_line(start, end, fixed(4), &targets, &mut tracker);
        let second = targets_in_line(start, end, fixed(4), &targets, &mut tracker);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_sector_expanding_band() {
        let sector = Sector::facing(Vec2Fixed::ZERO, Facing::Right, FRAC_PI_2, fixed(0), fixed(40));
        let targets = [target(1, 30, 0), target(2, 70, 10), target(3, -30, 0)];
        let mut tracker = HitTracker::new();

        let near = targets_in_sector(&sector, &targets, &mut tracker);
        assert_eq!(ids(&near), vec![1]);

        let far = targets_in_sector(&sector.with_radii(fixed(0), fixed(80)), &targets, &mut tracker);
        assert_eq!(ids(&far), vec![2]);
    }

    #[test]
    fn test_forward_half_space() {
        let targets = [target(1, 0, -10), target(2, 0, 10), target(3, 10, 0)];
        let ahead = forward_half_space(Vec2Fixed::ZERO, Facing::Up, &targets);
        assert_eq!(ids(&ahead), vec![1, 3]);
    }
}
