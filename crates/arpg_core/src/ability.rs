//! Ability definitions and in-flight activations.
//!
//! Every cast creates one [`Activation`] holding its own hit tracker and
//! candidate snapshot. Activations live in the [`Effects`] arena until
//! they finish or are cancelled; nothing is shared between two casts of
//! the same ability.
//!
//! Instant shapes (tile pattern, circle, line) resolve on their first
//! advance. Waves grow outward in steps, one band per interval, striking
//! each candidate at most once.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{EntityId, Faction, Facing, Target};
use crate::damage::WeaponType;
use crate::geometry::{pattern_to_tiles, rotate_pattern, Sector, TileOffset};
use crate::hit::{
    forward_half_space, targets_in_circle, targets_in_line, targets_in_sector, targets_in_tiles,
    HitTracker,
};
use crate::math::{Fixed, TileCoord, Vec2Fixed};

/// Area an ability covers. Distances are world units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbilityShape {
    /// Tile offsets relative to the caster, authored facing up.
    Pattern(Vec<TileOffset>),
    /// Circle centred `range_tiles` ahead of the caster.
    Circle {
        /// Radius.
        radius: u32,
    },
    /// Beam from the caster forward `range_tiles`.
    Line {
        /// Half of the beam width.
        half_width: u32,
    },
    /// Cone that travels outward from the caster.
    Wave {
        /// Full arc width in degrees.
        arc_degrees: u32,
        /// Inner radius of the cone.
        min_radius: u32,
        /// Radius at which the wave stops.
        max_radius: u32,
        /// Radius gained per expansion step.
        step: u32,
        /// Time between expansion steps.
        interval_ms: u64,
    },
}

/// Immutable ability definition, loaded with the content pack.
///
/// # Example RON
///
/// ```ron
/// AbilityDescriptor(
///     id: "cleave",
///     name: "ability.cleave.name",
///     base_damage: 12,
///     weapon: Melee,
///     range_tiles: 1,
///     shape: Pattern([(-1, -1), (0, -1), (1, -1)]),
///     cooldown_ms: 1500,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityDescriptor {
    /// Unique identifier.
    pub id: String,
    /// Localization key for the display name.
    pub name: String,
    /// Damage before attacker bonus.
    pub base_damage: u32,
    /// Skill key; also decides whether the damage is magic.
    pub weapon: WeaponType,
    /// Reach in tiles.
    pub range_tiles: u32,
    /// Covered area.
    pub shape: AbilityShape,
    /// Time before the ability can be cast again.
    #[serde(default)]
    pub cooldown_ms: u64,
}

impl AbilityDescriptor {
    /// Whether the ability deals magic damage.
    #[must_use]
    pub const fn is_magic(&self) -> bool {
        self.weapon.is_magic()
    }
}

/// Lifecycle of an activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationState {
    /// Still resolving hits.
    Active,
    /// Ran to completion.
    Finished,
    /// Torn down early; never resolves again.
    Cancelled,
}

/// Geometry of one activation, fixed at cast time.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Reach {
    Tiles(Vec<TileCoord>),
    Circle {
        center: Vec2Fixed,
        radius: Fixed,
    },
    Line {
        start: Vec2Fixed,
        end: Vec2Fixed,
        half_width: Fixed,
    },
    Wave {
        sector: Sector,
        inner: Fixed,
        outer: Fixed,
        max_radius: Fixed,
        step: Fixed,
        interval_ms: u64,
    },
}

/// Targets struck by one advance of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHits {
    /// Activation that produced the hits.
    pub effect: EffectId,
    /// Caster of the ability.
    pub caster: EntityId,
    /// Ability id.
    pub ability: String,
    /// Damage before attacker bonus.
    pub base_damage: u32,
    /// Skill key.
    pub weapon: WeaponType,
    /// Targets newly struck.
    pub targets: Vec<Target>,
}

/// Who cast an ability, from where, looking which way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caster {
    /// Casting entity.
    pub id: EntityId,
    /// Side the caster fights on; the opposing side is targeted.
    pub faction: Faction,
    /// World position at cast time.
    pub position: Vec2Fixed,
    /// Facing at cast time.
    pub facing: Facing,
}

/// Per-cast context: owns the hit tracker and the candidate snapshot.
#[derive(Debug, Clone)]
pub struct Activation {
    caster: EntityId,
    ability: String,
    base_damage: u32,
    weapon: WeaponType,
    target_faction: Faction,
    reach: Reach,
    /// Targets present at cast time; nothing spawned later is considered.
    candidates: BTreeSet<EntityId>,
    tracker: HitTracker,
    next_at_ms: u64,
    state: ActivationState,
}

impl Activation {
    /// Start a cast of `ability`.
    ///
    /// `roster` is the snapshot of potential targets at cast time. Waves
    /// keep only the targets in the forward half-space.
    #[must_use]
    pub fn new(
        caster: Caster,
        ability: &AbilityDescriptor,
        roster: &[Target],
        now_ms: u64,
        tile_size: Fixed,
    ) -> Self {
        let Caster {
            id: caster_id,
            faction,
            position: origin,
            facing,
        } = caster;
        let target_faction = faction.opponent();
        let forward = facing.unit_vector();
        let range = Fixed::from_num(ability.range_tiles) * tile_size;
        let ahead = origin + forward.scale(range);

        let reach = match &ability.shape {
            AbilityShape::Pattern(pattern) => {
                let anchor = TileCoord::from_world(origin, tile_size);
                Reach::Tiles(pattern_to_tiles(&rotate_pattern(pattern, facing), anchor))
            }
            AbilityShape::Circle { radius } => Reach::Circle {
                center: ahead,
                radius: Fixed::from_num(*radius),
            },
            AbilityShape::Line { half_width } => Reach::Line {
                start: origin,
                end: ahead,
                half_width: Fixed::from_num(*half_width),
            },
            AbilityShape::Wave {
                arc_degrees,
                min_radius,
                max_radius,
                step,
                interval_ms,
            } => {
                let inner = Fixed::from_num(*min_radius);
                let arc = f64::from(*arc_degrees).to_radians();
                Reach::Wave {
                    sector: Sector::facing(origin, facing, arc, inner, inner),
                    inner,
                    outer: inner,
                    max_radius: Fixed::from_num(*max_radius),
                    step: Fixed::from_num(*step),
                    interval_ms: *interval_ms,
                }
            }
        };

        let eligible = roster
            .iter()
            .filter(|t| t.faction == target_faction && t.id != caster_id);
        let candidates = if matches!(reach, Reach::Wave { .. }) {
            let pool: Vec<Target> = eligible.copied().collect();
            forward_half_space(origin, facing, &pool)
                .into_iter()
                .map(|t| t.id)
                .collect()
        } else {
            eligible.filter(|t| t.is_hittable()).map(|t| t.id).collect()
        };

        Self {
            caster: caster_id,
            ability: ability.id.clone(),
            base_damage: ability.base_damage,
            weapon: ability.weapon,
            target_faction,
            reach,
            candidates,
            tracker: HitTracker::new(),
            next_at_ms: now_ms,
            state: ActivationState::Active,
        }
    }

    /// Caster of this activation.
    #[must_use]
    pub const fn caster(&self) -> EntityId {
        self.caster
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ActivationState {
        self.state
    }

    /// Targets struck so far.
    #[must_use]
    pub const fn tracker(&self) -> &HitTracker {
        &self.tracker
    }

    /// Whether the activation should advance at `now_ms`.
    #[must_use]
    pub const fn is_due(&self, now_ms: u64) -> bool {
        matches!(self.state, ActivationState::Active) && now_ms >= self.next_at_ms
    }

    /// Stop resolving hits.
    pub fn cancel(&mut self) {
        if self.state == ActivationState::Active {
            self.state = ActivationState::Cancelled;
        }
    }

    /// Resolve the next batch of hits against the live roster.
    ///
    /// Only cast-time candidates that are still hittable can be struck,
    /// at their current positions. Returns nothing unless the activation
    /// is due.
    pub fn advance(&mut self, now_ms: u64, roster: &[Target], tile_size: Fixed) -> Vec<Target> {
        if !self.is_due(now_ms) {
            return Vec::new();
        }

        let live: Vec<Target> = roster
            .iter()
            .filter(|t| t.faction == self.target_faction && self.candidates.contains(&t.id))
            .copied()
            .collect();

        match &mut self.reach {
            Reach::Tiles(tiles) => {
                self.state = ActivationState::Finished;
                let hits = targets_in_tiles(tiles, &live, tile_size);
                record_all(&mut self.tracker, hits)
            }
            Reach::Circle { center, radius } => {
                self.state = ActivationState::Finished;
                let hits = targets_in_circle(*center, *radius, &live, None);
                record_all(&mut self.tracker, hits)
            }
            Reach::Line {
                start,
                end,
                half_width,
            } => {
                self.state = ActivationState::Finished;
                targets_in_line(*start, *end, *half_width, &live, &mut self.tracker)
            }
            Reach::Wave {
                sector,
                inner,
                outer,
                max_radius,
                step,
                interval_ms,
            } => {
                *outer = (*outer + *step).min(*max_radius);
                let band = sector.with_radii(*inner, *outer);
                let hits = targets_in_sector(&band, &live, &mut self.tracker);
                if *outer >= *max_radius || *step <= Fixed::ZERO {
                    self.state = ActivationState::Finished;
                } else {
                    self.next_at_ms = now_ms.saturating_add(*interval_ms);
                }
                hits
            }
        }
    }
}

fn record_all(tracker: &mut HitTracker, hits: Vec<Target>) -> Vec<Target> {
    hits.into_iter().filter(|t| tracker.record(t.id)).collect()
}

/// Identifier of an activation in the [`Effects`] arena.
pub type EffectId = u64;

/// Arena of in-flight activations.
#[derive(Debug, Clone, Default)]
pub struct Effects {
    next_id: EffectId,
    active: BTreeMap<EffectId, Activation>,
}

impl Effects {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of an activation.
    pub fn spawn(&mut self, activation: Activation) -> EffectId {
        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, activation);
        id
    }

    /// Activation by id, while it is in flight.
    #[must_use]
    pub fn get(&self, id: EffectId) -> Option<&Activation> {
        self.active.get(&id)
    }

    /// Number of activations in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Advance every due activation in id order and drop the finished ones.
    pub fn advance_due(&mut self, now_ms: u64, roster: &[Target], tile_size: Fixed) -> Vec<ResolvedHits> {
        let mut resolved = Vec::new();
        for (&effect, activation) in &mut self.active {
            if !activation.is_due(now_ms) {
                continue;
            }
            let targets = activation.advance(now_ms, roster, tile_size);
            if !targets.is_empty() {
                resolved.push(ResolvedHits {
                    effect,
                    caster: activation.caster,
                    ability: activation.ability.clone(),
                    base_damage: activation.base_damage,
                    weapon: activation.weapon,
                    targets,
                });
            }
        }
        self.active
            .retain(|_, activation| activation.state == ActivationState::Active);
        resolved
    }

    /// Cancel and drop one activation. Returns whether it existed.
    pub fn cancel(&mut self, id: EffectId) -> bool {
        match self.active.remove(&id) {
            Some(mut activation) => {
                activation.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel and drop every activation cast by `caster`.
    ///
    /// Returns how many were torn down.
    pub fn cancel_owned_by(&mut self, caster: EntityId) -> usize {
        let before = self.active.len();
        self.active.retain(|_, activation| {
            if activation.caster == caster {
                activation.cancel();
                false
            } else {
                true
            }
        });
        let cancelled = before - self.active.len();
        if cancelled > 0 {
            debug!(caster, cancelled, "cancelled in-flight effects");
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile() -> Fixed {
        Fixed::from_num(32)
    }

    fn monster(id: EntityId, x: i32, y: i32) -> Target {
        Target::new(id, Faction::Monster, Vec2Fixed::from_int(x, y))
    }

    fn ability(shape: AbilityShape) -> AbilityDescriptor {
        AbilityDescriptor {
            id: "test".to_string(),
            name: "ability.test.name".to_string(),
            base_damage: 10,
            weapon: WeaponType::Melee,
            range_tiles: 3,
            shape,
            cooldown_ms: 0,
        }
    }

    fn wave() -> AbilityDescriptor {
        ability(AbilityShape::Wave {
            arc_degrees: 90,
            min_radius: 0,
            max_radius: 96,
            step: 32,
            interval_ms: 100,
        })
    }

    // Caster stands at the center of tile (5, 5)
    fn origin() -> Vec2Fixed {
        TileCoord::new(5, 5).center(tile())
    }

    fn hero(id: EntityId, facing: Facing) -> Caster {
        Caster {
            id,
            faction: Faction::Hero,
            position: origin(),
            facing,
        }
    }

    #[test]
    fn test_pattern_rotates_with_facing() {
        let swing = ability(AbilityShape::Pattern(vec![(-1, -1), (0, -1), (1, -1)]));
        let right_side = [
            monster(1, 6 * 32 + 16, 4 * 32 + 16),
            monster(2, 6 * 32 + 16, 5 * 32 + 16),
            monster(3, 6 * 32 + 16, 6 * 32 + 16),
            monster(4, 5 * 32 + 16, 4 * 32 + 16),
        ];
        let mut activation = Activation::new(hero(0, Facing::Right), &swing, &right_side, 0, tile());
        let hits = activation.advance(0, &right_side, tile());
        let ids: Vec<_> = hits.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(activation.state(), ActivationState::Finished);
    }

    #[test]
    fn test_only_opponents_are_candidates() {
        let nova = ability(AbilityShape::Circle { radius: 64 });
        let mut roster = vec![monster(1, 176, 80)];
        roster.push(Target::new(2, Faction::Hero, Vec2Fixed::from_int(176, 80)));
        let mut activation = Activation::new(hero(0, Facing::Up), &nova, &roster, 0, tile());
        let hits = activation.advance(0, &roster, tile());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn test_targets_after_snapshot_are_ignored() {
        let beam = ability(AbilityShape::Line { half_width: 4 });
        let mut activation = Activation::new(hero(0, Facing::Right), &beam, &[], 0, tile());
        let late = [monster(7, 200, 176)];
        assert!(activation.advance(0, &late, tile()).is_empty());
    }

    #[test]
    fn test_wave_expands_and_hits_once() {
        let o = origin();
        let roster = [
            Target::new(1, Faction::Monster, o + Vec2Fixed::from_int(20, 0)),
            Target::new(2, Faction::Monster, o + Vec2Fixed::from_int(60, 5)),
            Target::new(3, Faction::Monster, o + Vec2Fixed::from_int(-40, 0)),
        ];
        let mut activation = Activation::new(hero(0, Facing::Right), &wave(), &roster, 0, tile());

        let first = activation.advance(0, &roster, tile());
        assert_eq!(first.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1]);

        // Not due yet
        assert!(activation.advance(50, &roster, tile()).is_empty());

        let second = activation.advance(100, &roster, tile());
        assert_eq!(second.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2]);

        let third = activation.advance(200, &roster, tile());
        assert!(third.is_empty());
        assert_eq!(activation.state(), ActivationState::Finished);
        assert_eq!(activation.tracker().len(), 2);
    }

    #[test]
    fn test_wave_skips_targets_dead_since_cast() {
        let o = origin();
        let mut roster = [Target::new(1, Faction::Monster, o + Vec2Fixed::from_int(60, 0))];
        let mut activation = Activation::new(hero(0, Facing::Right), &wave(), &roster, 0, tile());
        activation.advance(0, &roster, tile());
        roster[0].alive = false;
        assert!(activation.advance(100, &roster, tile()).is_empty());
    }

    #[test]
    fn test_effects_arena_drops_finished() {
        let mut effects = Effects::new();
        let roster = [monster(1, 176, 80)];
        let nova = ability(AbilityShape::Circle { radius: 64 });
        let id = effects.spawn(Activation::new(hero(0, Facing::Up), &nova, &roster, 0, tile()));

        let resolved = effects.advance_due(0, &roster, tile());
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].effect, id);
        assert_eq!(resolved[0].base_damage, 10);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_cancel_owned_by_tears_down_waves() {
        let o = origin();
        let roster = [Target::new(1, Faction::Monster, o + Vec2Fixed::from_int(60, 0))];
        let mut effects = Effects::new();
        effects.spawn(Activation::new(hero(9, Facing::Right), &wave(), &roster, 0, tile()));
        let other = effects.spawn(Activation::new(hero(3, Facing::Left), &wave(), &roster, 0, tile()));

        assert!(effects.advance_due(0, &roster, tile()).is_empty());
        assert_eq!(effects.cancel_owned_by(9), 1);
        assert_eq!(effects.len(), 1);
        assert!(effects.get(other).is_some());

        // The cancelled wave would have reached target 1 on this step
        assert!(effects.advance_due(100, &roster, tile()).is_empty());
        assert!(effects.cancel(other));
        assert!(!effects.cancel(other));
    }

    #[test]
    fn test_cancelled_activation_never_resolves() {
        let o = origin();
        let roster = [Target::new(1, Faction::Monster, o + Vec2Fixed::from_int(20, 0))];
        let mut activation = Activation::new(hero(0, Facing::Right), &wave(), &roster, 0, tile());
        activation.cancel();
        assert_eq!(activation.state(), ActivationState::Cancelled);
        assert!(activation.advance(0, &roster, tile()).is_empty());
    }
}
