//! Hostile agent decision making.
//!
//! Each agent is a small state machine:
//!
//! ```text
//!   Dormant ──target within aggro range──▶ Aggressive
//!      ▲                                      │
//!      │        target beyond lose range      │ provoke()
//!      └──────────────────────────────────────┤
//!      ▲                                      ▼
//!      └────────target beyond lose range── Provoked
//! ```
//!
//! Dormant agents wander on a slow random timer. Engaged agents pursue
//! (melee) or hold a distance band around their preferred range (ranged
//! and magic). Decisions are rate limited by a per-attack-type cooldown,
//! and no new step is planned while the previous step is still running.
//!
//! The state machine never moves anything itself. It returns a
//! [`Decision`] that the owner executes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::components::{EntityId, Facing};
use crate::config::{CombatConfig, WanderConfig};
use crate::damage::WeaponType;
use crate::math::{Fixed, TileCoord, Vec2Fixed};
use crate::movement::{next_step, random_step, MoveGuard, Step, StepIntent};
use crate::rng::CombatRng;

// ============================================================================
// Profiles
// ============================================================================

/// How an agent attacks, which fixes its preferred fighting distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttackType {
    /// Closes to an adjacent tile.
    #[default]
    Melee,
    /// Keeps its distance with bows or thrown weapons.
    Ranged,
    /// Keeps its distance with spells.
    Magic,
}

impl AttackType {
    /// Preferred distance in tiles.
    #[must_use]
    pub const fn preferred_tiles(self) -> u32 {
        match self {
            AttackType::Melee => 1,
            AttackType::Ranged | AttackType::Magic => 5,
        }
    }

    /// Preferred distance in world units.
    #[must_use]
    pub fn preferred_distance(self, tile_size: Fixed) -> Fixed {
        Fixed::from_num(self.preferred_tiles()) * tile_size
    }

    /// Whether this attack type holds a distance band rather than closing in.
    #[must_use]
    pub const fn keeps_distance(self) -> bool {
        !matches!(self, AttackType::Melee)
    }

    /// Skill key used for damage classification.
    #[must_use]
    pub const fn weapon(self) -> WeaponType {
        match self {
            AttackType::Melee => WeaponType::Melee,
            AttackType::Ranged => WeaponType::Archery,
            AttackType::Magic => WeaponType::Magic,
        }
    }

    /// Decision cooldown configured for this attack type.
    #[must_use]
    pub const fn decision_delay_ms(self, config: &CombatConfig) -> u64 {
        match self {
            AttackType::Melee => config.melee_decision_delay_ms,
            AttackType::Ranged | AttackType::Magic => config.ranged_decision_delay_ms,
        }
    }
}

/// Immutable per-monster behavior parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    /// Attack style.
    pub attack_type: AttackType,
    /// Distance at which a dormant agent notices its target.
    pub aggro_range: Fixed,
    /// Distance beyond which an engaged agent gives up.
    pub lose_aggro_range: Fixed,
}

impl AgentProfile {
    /// Create a profile with ranges given in tiles.
    #[must_use]
    pub fn from_tiles(attack_type: AttackType, aggro_tiles: u32, lose_tiles: u32, tile_size: Fixed) -> Self {
        Self {
            attack_type,
            aggro_range: Fixed::from_num(aggro_tiles) * tile_size,
            lose_aggro_range: Fixed::from_num(lose_tiles) * tile_size,
        }
    }
}

/// Tuning an agent copies from the engine config at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Tuning {
    tile_size: Fixed,
    decision_delay_ms: u64,
    kite_min_percent: u32,
    kite_max_percent: u32,
    wander: WanderConfig,
}

// ============================================================================
// Decisions
// ============================================================================

/// Coarse aggression state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggroState {
    /// No target, wandering.
    Dormant,
    /// Target acquired by range.
    Aggressive,
    /// Forced aggression, e.g. after being struck first.
    Provoked,
}

/// Why a step was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepReason {
    /// Closing in on the target.
    Pursue,
    /// Opening distance from the target.
    Retreat,
    /// Random dormant movement.
    Wander,
    /// Dormant movement back toward the spawn tile.
    ReturnHome,
}

/// What the agent wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentAction {
    /// Nothing.
    Idle,
    /// Take one tile step. The move guard is already set.
    Step {
        /// Tile delta.
        step: Step,
        /// Why the step was chosen.
        reason: StepReason,
    },
    /// Turn without moving.
    Face(Facing),
    /// Turn and attack.
    Attack {
        /// Direction of the attack.
        facing: Facing,
    },
}

/// Notable state transitions, for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorChange {
    /// Target acquired.
    AggroAcquired,
    /// Target lost; back to wandering.
    AggroLost,
    /// Started closing distance.
    Pursuing,
    /// Started opening distance.
    Retreating,
    /// Holding position in attack range.
    Holding,
}

/// Result of one behavior update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Action to execute.
    pub action: AgentAction,
    /// Transitions that happened during the update.
    pub changes: Vec<BehaviorChange>,
}

impl Decision {
    /// No action, no transitions.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            action: AgentAction::Idle,
            changes: Vec::new(),
        }
    }
}

/// What the agent observes about the world this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Perception {
    /// Agent's own world position.
    pub position: Vec2Fixed,
    /// Reference target position, if one exists.
    pub target: Option<Vec2Fixed>,
    /// Whether the agent's attack cooldown has elapsed.
    pub attack_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Engagement {
    Pursuing,
    Retreating,
    Holding,
}

impl Engagement {
    const fn change(self) -> BehaviorChange {
        match self {
            Engagement::Pursuing => BehaviorChange::Pursuing,
            Engagement::Retreating => BehaviorChange::Retreating,
            Engagement::Holding => BehaviorChange::Holding,
        }
    }
}

// ============================================================================
// Agent
// ============================================================================

/// Mutable combat state of one hostile agent.
#[derive(Debug, Clone)]
pub struct Agent {
    id: EntityId,
    profile: AgentProfile,
    tuning: Tuning,
    spawn_tile: TileCoord,
    facing: Facing,
    is_aggressive: bool,
    is_provoked: bool,
    last_decision_ms: Option<u64>,
    movement: MoveGuard,
    next_wander_ms: Option<u64>,
    engagement: Option<Engagement>,
}

impl Agent {
    /// Create a dormant agent spawned at `spawn`.
    #[must_use]
    pub fn new(id: EntityId, profile: AgentProfile, spawn: Vec2Fixed, config: &CombatConfig) -> Self {
        let tile_size = config.tile_size_fixed();
        Self {
            id,
            profile,
            tuning: Tuning {
                tile_size,
                decision_delay_ms: profile.attack_type.decision_delay_ms(config),
                kite_min_percent: config.kite_min_percent,
                kite_max_percent: config.kite_max_percent,
                wander: config.wander,
            },
            spawn_tile: TileCoord::from_world(spawn, tile_size),
            facing: Facing::default(),
            is_aggressive: false,
            is_provoked: false,
            last_decision_ms: None,
            movement: MoveGuard::new(id),
            next_wander_ms: None,
            engagement: None,
        }
    }

    /// Entity this agent drives.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Behavior parameters.
    #[must_use]
    pub const fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Preferred fighting distance in world units.
    #[must_use]
    pub fn preferred_distance(&self) -> Fixed {
        self.profile.attack_type.preferred_distance(self.tuning.tile_size)
    }

    /// Tile the agent spawned on.
    #[must_use]
    pub const fn spawn_tile(&self) -> TileCoord {
        self.spawn_tile
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Whether the agent acquired its target by range.
    #[must_use]
    pub const fn is_aggressive(&self) -> bool {
        self.is_aggressive
    }

    /// Whether the agent has been forced into aggression.
    #[must_use]
    pub const fn is_provoked(&self) -> bool {
        self.is_provoked
    }

    /// Whether a step is still running.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.movement.is_moving()
    }

    /// Pursuit and retreat require one of the aggression flags.
    #[must_use]
    pub const fn is_engaged(&self) -> bool {
        self.is_aggressive || self.is_provoked
    }

    /// Coarse state, with the provoked override taking precedence.
    #[must_use]
    pub const fn state(&self) -> AggroState {
        if self.is_provoked {
            AggroState::Provoked
        } else if self.is_aggressive {
            AggroState::Aggressive
        } else {
            AggroState::Dormant
        }
    }

    /// Force aggression regardless of range.
    ///
    /// Returns [`BehaviorChange::AggroAcquired`] if the agent was dormant.
    pub fn provoke(&mut self) -> Option<BehaviorChange> {
        let was_engaged = self.is_engaged();
        self.is_provoked = true;
        (!was_engaged).then_some(BehaviorChange::AggroAcquired)
    }

    /// Run one rate-limited decision.
    ///
    /// Does nothing while a step is running or while the decision cooldown
    /// has not elapsed since the last decision.
    pub fn update<F>(&mut self, now_ms: u64, perception: &Perception, walkable: F, rng: &mut CombatRng) -> Decision
    where
        F: Fn(TileCoord) -> bool,
    {
        if self.movement.is_moving() {
            return Decision::idle();
        }
        if let Some(last) = self.last_decision_ms {
            if now_ms.saturating_sub(last) < self.tuning.decision_delay_ms {
                return Decision::idle();
            }
        }
        self.last_decision_ms = Some(now_ms);
        self.decide(now_ms, perception, &walkable, rng)
    }

    /// Completion signal of the running step.
    ///
    /// An engaged agent decides again immediately, skipping the cooldown,
    /// so pursuit continues without a pause. A dormant agent just becomes
    /// idle until its next update.
    pub fn on_step_complete<F>(
        &mut self,
        now_ms: u64,
        perception: &Perception,
        walkable: F,
        rng: &mut CombatRng,
    ) -> Decision
    where
        F: Fn(TileCoord) -> bool,
    {
        self.movement.complete();
        if !self.is_engaged() {
            return Decision::idle();
        }
        self.last_decision_ms = Some(now_ms);
        self.decide(now_ms, perception, &walkable, rng)
    }

    fn decide<F>(&mut self, now_ms: u64, perception: &Perception, walkable: &F, rng: &mut CombatRng) -> Decision
    where
        F: Fn(TileCoord) -> bool,
    {
        let mut changes = Vec::new();
        let distance = perception.target.map(|t| perception.position.distance(t));

        if self.is_engaged() {
            if distance.map_or(true, |d| d > self.profile.lose_aggro_range) {
                self.is_aggressive = false;
                self.is_provoked = false;
                self.engagement = None;
                self.next_wander_ms = None;
                changes.push(BehaviorChange::AggroLost);
            }
        } else if distance.is_some_and(|d| d <= self.profile.aggro_range) {
            self.is_aggressive = true;
            changes.push(BehaviorChange::AggroAcquired);
        }

        let action = match (perception.target, distance) {
            (Some(target), Some(distance)) if self.is_engaged() => {
                self.engage(perception, target, distance, walkable, rng, &mut changes)
            }
            _ => self.wander(now_ms, perception.position, walkable, rng),
        };

        Decision { action, changes }
    }

    fn engage<F>(
        &mut self,
        perception: &Perception,
        target: Vec2Fixed,
        distance: Fixed,
        walkable: &F,
        rng: &mut CombatRng,
        changes: &mut Vec<BehaviorChange>,
    ) -> AgentAction
    where
        F: Fn(TileCoord) -> bool,
    {
        let preferred = self.preferred_distance();
        let mode = if self.profile.attack_type.keeps_distance() {
            let hundred = Fixed::from_num(100);
            let near = preferred * Fixed::from_num(self.tuning.kite_min_percent) / hundred;
            let far = preferred * Fixed::from_num(self.tuning.kite_max_percent) / hundred;
            if distance < near {
                Engagement::Retreating
            } else if distance > far {
                Engagement::Pursuing
            } else {
                Engagement::Holding
            }
        } else if distance > preferred {
            Engagement::Pursuing
        } else {
            Engagement::Holding
        };

        if self.engagement != Some(mode) {
            self.engagement = Some(mode);
            changes.push(mode.change());
        }

        let toward = Facing::toward(perception.position, target).unwrap_or(self.facing);
        let (intent, reason) = match mode {
            Engagement::Holding => {
                self.facing = toward;
                return if perception.attack_ready {
                    AgentAction::Attack { facing: toward }
                } else {
                    AgentAction::Face(toward)
                };
            }
            Engagement::Pursuing => (StepIntent::Towards, StepReason::Pursue),
            Engagement::Retreating => (StepIntent::Away, StepReason::Retreat),
        };

        let tile_size = self.tuning.tile_size;
        let from = TileCoord::from_world(perception.position, tile_size);
        let reference = TileCoord::from_world(target, tile_size);
        match next_step(from, reference, walkable, intent, rng) {
            Some(step) => self.begin_step(step, reason),
            None => {
                debug!(agent = self.id, ?intent, "no walkable step, facing target instead");
                self.facing = toward;
                AgentAction::Face(toward)
            }
        }
    }

    fn wander<F>(&mut self, now_ms: u64, position: Vec2Fixed, walkable: &F, rng: &mut CombatRng) -> AgentAction
    where
        F: Fn(TileCoord) -> bool,
    {
        let wander = self.tuning.wander;
        let due = match self.next_wander_ms {
            Some(at) => now_ms >= at,
            None => false,
        };
        if !due {
            if self.next_wander_ms.is_none() {
                self.schedule_wander(now_ms, rng);
            }
            return AgentAction::Idle;
        }
        self.schedule_wander(now_ms, rng);

        if rng.percent(wander.idle_facing_percent) {
            let facing = rng.choose(&Facing::ALL).copied().unwrap_or(self.facing);
            self.facing = facing;
            return AgentAction::Face(facing);
        }

        let here = TileCoord::from_world(position, self.tuning.tile_size);
        let (step, reason) = if here.chebyshev_distance(self.spawn_tile) > wander.home_radius_tiles {
            (
                next_step(here, self.spawn_tile, walkable, StepIntent::Towards, rng),
                StepReason::ReturnHome,
            )
        } else {
            (random_step(here, walkable, rng), StepReason::Wander)
        };

        match step {
            Some(step) => self.begin_step(step, reason),
            None => {
                debug!(agent = self.id, "nowhere to wander");
                AgentAction::Idle
            }
        }
    }

    fn schedule_wander(&mut self, now_ms: u64, rng: &mut CombatRng) {
        let wander = self.tuning.wander;
        let delay = rng.range_inclusive(wander.min_interval_ms, wander.max_interval_ms);
        self.next_wander_ms = Some(now_ms.saturating_add(delay));
    }

    fn begin_step(&mut self, step: Step, reason: StepReason) -> AgentAction {
        if let Err(err) = self.movement.try_begin() {
            debug!(agent = self.id, %err, "step rejected");
            return AgentAction::Idle;
        }
        self.facing = step.facing();
        AgentAction::Step { step, reason }
    }
}
