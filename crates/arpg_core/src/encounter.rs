//! Reference world: one hero against a roster of monsters on a grid.
//!
//! The encounter owns every entity and implements the engine's world
//! traits over them. It runs at a fixed tick rate and processes monsters
//! in ascending id order, so a seed and a sequence of hero actions always
//! reproduce the same fight.
//!
//! # Tick order
//!
//! 1. **Step completion** - snap finished steps to their destination and
//!    let engaged agents chain their next decision
//! 2. **Decisions** - rate-limited behavior update per agent
//! 3. **Effects** - advance in-flight ability activations
//! 4. **Deaths** - remove the dead and cancel their effects
//!
//! Hero actions ([`Encounter::player_attack`], [`Encounter::cast`]) resolve
//! immediately; their events are delivered with the next tick.
//!
//! # Example
//!
//! ```
//! use arpg_core::prelude::*;
//!
//! let mut encounter = Encounter::new(
//!     CombatConfig::default(),
//!     ContentPack::default(),
//!     CollisionGrid::new(8, 8),
//!     HeroSetup::default(),
//!     7,
//! );
//! let events = encounter.tick();
//! assert!(events.deaths.is_empty());
//! assert_eq!(encounter.now_ms(), 50);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use tracing::{debug, warn};

use crate::ability::{Activation, Caster, EffectId, Effects};
use crate::behavior::{Agent, AgentAction, AttackType, Decision, Perception};
use crate::components::{EntityId, Faction, Facing, Health, Target};
use crate::config::CombatConfig;
use crate::damage::{ability_damage, auto_attack_damage, resolve_hit, Defense, StatBundle, WeaponType};
use crate::data::{ContentPack, MonsterData};
use crate::error::{CombatError, Result};
use crate::events::{CombatEvent, CombatObserver, EventBus};
use crate::geometry::{pattern_to_tiles, rotate_pattern, TileOffset};
use crate::hit::{targets_in_circle, targets_in_tiles};
use crate::math::{Fixed, TileCoord, Vec2Fixed};
use crate::rng::CombatRng;
use crate::world::{CollisionGrid, DamageSink, StatProvider, WorldQuery};

/// Ticks per second.
pub const TICK_RATE: u32 = 20;

/// Duration of one tick in milliseconds.
pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE as u64;

/// Entity id of the hero. Monsters are numbered from 1.
pub const HERO_ID: EntityId = 0;

/// Tiles struck by the hero's basic attack, authored facing up.
const HERO_SWING: [TileOffset; 1] = [(0, -1)];

/// Starting state of the hero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroSetup {
    /// Spawn tile.
    pub tile: TileCoord,
    /// Equipment and skill snapshot.
    pub stats: StatBundle,
    /// Equipped weapon kind.
    pub weapon: WeaponType,
    /// Maximum health.
    pub max_health: u32,
    /// Time between basic attacks.
    pub attack_cooldown_ms: u64,
}

impl Default for HeroSetup {
    fn default() -> Self {
        Self {
            tile: TileCoord::new(0, 0),
            stats: StatBundle::new(10, 5, 1),
            weapon: WeaponType::Melee,
            max_health: 100,
            attack_cooldown_ms: 800,
        }
    }
}

/// The player character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hero {
    position: Vec2Fixed,
    facing: Facing,
    stats: StatBundle,
    weapon: WeaponType,
    health: Health,
    attack_cooldown_ms: u64,
    attack_ready_at_ms: u64,
}

impl Hero {
    /// World position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Current facing.
    #[must_use]
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Equipment and skill snapshot.
    #[must_use]
    pub const fn stats(&self) -> &StatBundle {
        &self.stats
    }

    /// Whether the hero still stands.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PendingStep {
    destination: TileCoord,
    completes_at_ms: u64,
}

/// A spawned monster.
#[derive(Debug, Clone)]
pub struct Monster {
    id: EntityId,
    data: MonsterData,
    position: Vec2Fixed,
    health: Health,
    agent: Agent,
    pending: Option<PendingStep>,
    attack_ready_at_ms: u64,
}

impl Monster {
    /// Entity id.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Content definition.
    #[must_use]
    pub const fn data(&self) -> &MonsterData {
        &self.data
    }

    /// World position. Stays on the origin tile until a step completes.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Health.
    #[must_use]
    pub const fn health(&self) -> Health {
        self.health
    }

    /// Behavior state.
    #[must_use]
    pub const fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Tile the running step ends on.
    #[must_use]
    pub fn step_destination(&self) -> Option<TileCoord> {
        self.pending.map(|p| p.destination)
    }

    fn target(&self) -> Target {
        let mut target = Target::new(self.id, Faction::Monster, self.position);
        target.alive = !self.health.is_dead();
        target
    }
}

/// Events generated during a tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickEvents {
    /// Everything that happened, in order, including hero actions taken
    /// since the previous tick.
    pub events: Vec<CombatEvent>,
    /// Entities removed this tick.
    pub deaths: Vec<EntityId>,
}

/// One fight.
pub struct Encounter {
    config: CombatConfig,
    content: ContentPack,
    grid: CollisionGrid,
    tick: u64,
    now_ms: u64,
    next_id: EntityId,
    hero: Hero,
    hero_reported_dead: bool,
    monsters: BTreeMap<EntityId, Monster>,
    effects: Effects,
    ability_ready_at_ms: BTreeMap<String, u64>,
    rng: CombatRng,
    bus: EventBus,
    queued: TickEvents,
}

impl std::fmt::Debug for Encounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encounter")
            .field("tick", &self.tick)
            .field("now_ms", &self.now_ms)
            .field("hero", &self.hero)
            .field("monsters", &self.monsters.len())
            .field("effects", &self.effects.len())
            .finish_non_exhaustive()
    }
}

impl Encounter {
    /// Create an encounter with only the hero present.
    #[must_use]
    pub fn new(
        config: CombatConfig,
        content: ContentPack,
        grid: CollisionGrid,
        hero: HeroSetup,
        seed: u64,
    ) -> Self {
        let tile_size = config.tile_size_fixed();
        Self {
            config,
            content,
            grid,
            tick: 0,
            now_ms: 0,
            next_id: HERO_ID + 1,
            hero: Hero {
                position: hero.tile.center(tile_size),
                facing: Facing::default(),
                stats: hero.stats,
                weapon: hero.weapon,
                health: Health::new(hero.max_health),
                attack_cooldown_ms: hero.attack_cooldown_ms,
                attack_ready_at_ms: 0,
            },
            hero_reported_dead: false,
            monsters: BTreeMap::new(),
            effects: Effects::new(),
            ability_ready_at_ms: BTreeMap::new(),
            rng: CombatRng::new(seed),
            bus: EventBus::new(),
            queued: TickEvents::default(),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Number of ticks run.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Encounter clock.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Engine tuning.
    #[must_use]
    pub const fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Loaded content.
    #[must_use]
    pub const fn content(&self) -> &ContentPack {
        &self.content
    }

    /// Static collision layer.
    #[must_use]
    pub const fn grid(&self) -> &CollisionGrid {
        &self.grid
    }

    /// The hero.
    #[must_use]
    pub const fn hero(&self) -> &Hero {
        &self.hero
    }

    /// Monster by id.
    #[must_use]
    pub fn monster(&self, id: EntityId) -> Option<&Monster> {
        self.monsters.get(&id)
    }

    /// Living monsters in id order.
    pub fn monsters(&self) -> impl Iterator<Item = &Monster> {
        self.monsters.values()
    }

    /// In-flight ability activations.
    #[must_use]
    pub const fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Register a presentation observer.
    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) {
        self.bus.subscribe(observer);
    }

    fn tile_size(&self) -> Fixed {
        self.config.tile_size_fixed()
    }

    fn hero_tile(&self) -> TileCoord {
        TileCoord::from_world(self.hero.position, self.tile_size())
    }

    fn hero_target(&self) -> Target {
        let mut target = Target::new(HERO_ID, Faction::Hero, self.hero.position);
        target.alive = self.hero.is_alive();
        target
    }

    /// Tiles taken by the hero, every monster, and every running step's
    /// destination.
    fn occupied_tiles(&self) -> BTreeSet<TileCoord> {
        let tile_size = self.tile_size();
        let mut occupied = BTreeSet::new();
        if self.hero.is_alive() {
            occupied.insert(self.hero_tile());
        }
        for monster in self.monsters.values() {
            occupied.insert(TileCoord::from_world(monster.position, tile_size));
            if let Some(step) = monster.pending {
                occupied.insert(step.destination);
            }
        }
        occupied
    }

    // ------------------------------------------------------------------
    // Spawning and hero control
    // ------------------------------------------------------------------

    /// Spawn a monster of type `kind` on `tile`.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownMonster`] for an unknown type and
    /// [`CombatError::InvalidData`] if the tile is blocked or occupied.
    pub fn spawn_monster(&mut self, kind: &str, tile: TileCoord) -> Result<EntityId> {
        let data = self.content.monster(kind)?.clone();
        if !self.is_walkable(tile) {
            return Err(CombatError::InvalidData {
                kind: "spawn",
                id: kind.to_string(),
                reason: format!("tile ({}, {}) is blocked or occupied", tile.x, tile.y),
            });
        }

        let id = self.next_id;
        self.next_id += 1;
        let tile_size = self.tile_size();
        let position = tile.center(tile_size);
        let agent = Agent::new(id, data.profile(tile_size), position, &self.config);
        debug!(entity = id, kind, x = tile.x, y = tile.y, "monster spawned");
        self.monsters.insert(
            id,
            Monster {
                id,
                health: Health::new(data.health),
                data,
                position,
                agent,
                pending: None,
                attack_ready_at_ms: 0,
            },
        );
        Ok(id)
    }

    /// Move the hero to `tile` instantly.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::InvalidData`] if the tile is blocked or
    /// occupied by a monster.
    pub fn place_hero(&mut self, tile: TileCoord) -> Result<()> {
        if tile != self.hero_tile() && !self.is_walkable(tile) {
            return Err(CombatError::InvalidData {
                kind: "hero",
                id: "hero".to_string(),
                reason: format!("tile ({}, {}) is blocked or occupied", tile.x, tile.y),
            });
        }
        self.hero.position = tile.center(self.tile_size());
        Ok(())
    }

    /// Turn the hero.
    pub fn face_hero(&mut self, facing: Facing) {
        self.hero.facing = facing;
    }

    /// Turn the hero and step one tile that way if possible.
    ///
    /// Returns whether the hero moved.
    pub fn hero_step(&mut self, facing: Facing) -> bool {
        self.hero.facing = facing;
        if !self.hero.is_alive() {
            return false;
        }
        let (dx, dy) = facing.tile_delta();
        let destination = self.hero_tile().offset(dx, dy);
        if !self.is_walkable(destination) {
            return false;
        }
        self.hero.position = destination.center(self.tile_size());
        true
    }

    fn ensure_ready(&self, action: &str, ready_at_ms: u64) -> Result<()> {
        if !self.hero.is_alive() {
            return Err(CombatError::EntityDead(HERO_ID));
        }
        if self.now_ms < ready_at_ms {
            return Err(CombatError::NotReady {
                action: action.to_string(),
                ready_in_ms: ready_at_ms - self.now_ms,
            });
        }
        Ok(())
    }

    /// Basic weapon attack on the tile in front of the hero.
    ///
    /// Monsters struck become provoked. Returns the ids struck.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::NotReady`] during the attack cooldown and
    /// [`CombatError::EntityDead`] once the hero has fallen.
    pub fn player_attack(&mut self) -> Result<Vec<EntityId>> {
        self.ensure_ready("attack", self.hero.attack_ready_at_ms)?;
        let cooldown = self.attack_cooldown_ms(HERO_ID).unwrap_or_default();
        self.hero.attack_ready_at_ms = self.now_ms.saturating_add(cooldown);

        let stats = self
            .attacker_stats(HERO_ID)
            .ok_or(CombatError::EntityNotFound(HERO_ID))?;
        let weapon = self.hero.weapon;
        let raw = auto_attack_damage(&stats, weapon);

        let tiles = pattern_to_tiles(&rotate_pattern(&HERO_SWING, self.hero.facing), self.hero_tile());
        let roster = self.active_targets(Faction::Monster);
        let hits = targets_in_tiles(&tiles, &roster, self.tile_size());

        let mut events = Vec::new();
        for target in &hits {
            self.deal_damage(HERO_ID, *target, raw, weapon, &mut events);
            self.provoke(target.id, &mut events);
        }
        self.finish_hero_action(events);
        Ok(hits.iter().map(|t| t.id).collect())
    }

    /// Cast an ability from the hero's position along the hero's facing.
    ///
    /// Instant shapes resolve before this returns; waves strike their
    /// first band now and continue on later ticks.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownAbility`], [`CombatError::NotReady`]
    /// during the ability's cooldown, or [`CombatError::EntityDead`].
    pub fn cast(&mut self, ability_id: &str) -> Result<EffectId> {
        let ability = self.content.ability(ability_id)?.clone();
        let ready_at = self
            .ability_ready_at_ms
            .get(&ability.id)
            .copied()
            .unwrap_or_default();
        self.ensure_ready(&ability.id, ready_at)?;
        self.ability_ready_at_ms
            .insert(ability.id.clone(), self.now_ms.saturating_add(ability.cooldown_ms));

        let caster = Caster {
            id: HERO_ID,
            faction: Faction::Hero,
            position: self.hero.position,
            facing: self.hero.facing,
        };
        let roster = self.active_targets(Faction::Monster);
        let activation = Activation::new(caster, &ability, &roster, self.now_ms, self.tile_size());
        let effect = self.effects.spawn(activation);
        debug!(ability = %ability.id, effect, "ability cast");

        let mut events = Vec::new();
        self.resolve_effects(self.now_ms, &mut events);
        self.finish_hero_action(events);
        Ok(effect)
    }

    fn finish_hero_action(&mut self, mut events: Vec<CombatEvent>) {
        let mut deaths = self.reap_dead(&mut events);
        self.queued.events.append(&mut events);
        self.queued.deaths.append(&mut deaths);
    }

    // ------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------

    /// Advance the encounter by one tick.
    ///
    /// Returns the events of this tick, preceded by those of hero actions
    /// taken since the previous tick, and publishes them to observers.
    pub fn tick(&mut self) -> TickEvents {
        let mut out = std::mem::take(&mut self.queued);
        let mut events = Vec::new();

        self.tick += 1;
        self.now_ms = self.tick * TICK_DURATION_MS;
        let now = self.now_ms;

        let ids: Vec<EntityId> = self.monsters.keys().copied().collect();
        let mut occupied = self.occupied_tiles();

        // 1. Step completion
        for &id in &ids {
            self.finish_step(id, now, &mut occupied, &mut events);
        }

        // 2. Decisions
        for &id in &ids {
            self.run_agent(id, now, &mut occupied, &mut events);
        }

        // 3. Effects
        self.resolve_effects(now, &mut events);

        // 4. Deaths
        let mut deaths = self.reap_dead(&mut events);

        out.events.append(&mut events);
        out.deaths.append(&mut deaths);
        self.bus.publish_all(&out.events);

        #[cfg(feature = "debug-validation")]
        self.validate_invariants();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Encounter state hash");
        }

        out
    }

    fn perceive(&self, id: EntityId, now_ms: u64) -> Option<Perception> {
        let monster = self.monsters.get(&id)?;
        Some(Perception {
            position: monster.position,
            target: self.hero.is_alive().then_some(self.hero.position),
            attack_ready: now_ms >= monster.attack_ready_at_ms,
        })
    }

    fn finish_step(
        &mut self,
        id: EntityId,
        now: u64,
        occupied: &mut BTreeSet<TileCoord>,
        events: &mut Vec<CombatEvent>,
    ) {
        let tile_size = self.tile_size();
        let Some(monster) = self.monsters.get_mut(&id) else {
            return;
        };
        let Some(step) = monster.pending.filter(|p| p.completes_at_ms <= now) else {
            return;
        };
        occupied.remove(&TileCoord::from_world(monster.position, tile_size));
        monster.position = step.destination.center(tile_size);
        monster.pending = None;

        let Some(perception) = self.perceive(id, now) else {
            return;
        };
        let Some(monster) = self.monsters.get_mut(&id) else {
            return;
        };
        let grid = &self.grid;
        let decision = monster.agent.on_step_complete(
            now,
            &perception,
            |t| grid.is_open(t) && !occupied.contains(&t),
            &mut self.rng,
        );
        self.execute(id, decision, now, occupied, events);
    }

    fn run_agent(
        &mut self,
        id: EntityId,
        now: u64,
        occupied: &mut BTreeSet<TileCoord>,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(perception) = self.perceive(id, now) else {
            return;
        };
        let Some(monster) = self.monsters.get_mut(&id) else {
            return;
        };
        if monster.health.is_dead() {
            return;
        }
        let grid = &self.grid;
        let decision = monster.agent.update(
            now,
            &perception,
            |t| grid.is_open(t) && !occupied.contains(&t),
            &mut self.rng,
        );
        self.execute(id, decision, now, occupied, events);
    }

    fn execute(
        &mut self,
        id: EntityId,
        decision: Decision,
        now: u64,
        occupied: &mut BTreeSet<TileCoord>,
        events: &mut Vec<CombatEvent>,
    ) {
        events.extend(
            decision
                .changes
                .into_iter()
                .map(|change| CombatEvent::StateChanged { agent: id, change }),
        );

        match decision.action {
            AgentAction::Idle => {}
            AgentAction::Step { step, reason } => {
                let tile_size = self.tile_size();
                let step_duration_ms = self.config.step_duration_ms;
                let Some(monster) = self.monsters.get_mut(&id) else {
                    return;
                };
                let destination = step.apply(TileCoord::from_world(monster.position, tile_size));
                occupied.insert(destination);
                monster.pending = Some(PendingStep {
                    destination,
                    completes_at_ms: now.saturating_add(step_duration_ms),
                });
                debug!(agent = id, ?reason, x = destination.x, y = destination.y, "step started");
                events.push(CombatEvent::Stepped {
                    agent: id,
                    facing: step.facing(),
                    destination,
                });
            }
            AgentAction::Face(facing) => {
                events.push(CombatEvent::Faced { agent: id, facing });
            }
            AgentAction::Attack { facing } => {
                events.push(CombatEvent::Faced { agent: id, facing });
                self.monster_attack(id, facing, now, events);
            }
        }
    }

    fn monster_attack(&mut self, id: EntityId, facing: Facing, now: u64, events: &mut Vec<CombatEvent>) {
        let cooldown = self.attack_cooldown_ms(id).unwrap_or_default();
        let Some(monster) = self.monsters.get_mut(&id) else {
            return;
        };
        monster.attack_ready_at_ms = now.saturating_add(cooldown);
        let position = monster.position;
        let data = monster.data.clone();

        let tile_size = self.tile_size();
        let heroes = self.active_targets(Faction::Hero);
        let struck = match data.attack_type {
            AttackType::Melee => {
                let (dx, dy) = facing.tile_delta();
                let ahead = TileCoord::from_world(position, tile_size).offset(dx, dy);
                targets_in_tiles(&[ahead], &heroes, tile_size)
            }
            AttackType::Ranged | AttackType::Magic => {
                let Some(primary) = heroes.first().copied() else {
                    return;
                };
                let mut struck = vec![primary];
                if let Some(radius) = data.splash_radius {
                    struck.extend(targets_in_circle(
                        primary.position,
                        Fixed::from_num(radius),
                        &heroes,
                        Some(primary.id),
                    ));
                }
                struck
            }
        };

        let raw = data.attack_damage();
        let weapon = data.attack_type.weapon();
        for target in struck {
            self.deal_damage(id, target, raw, weapon, events);
        }
    }

    fn resolve_effects(&mut self, now: u64, events: &mut Vec<CombatEvent>) {
        let mut roster = vec![self.hero_target()];
        roster.extend(self.monsters.values().map(Monster::target));

        for batch in self.effects.advance_due(now, &roster, self.tile_size()) {
            let Some(stats) = self.attacker_stats(batch.caster) else {
                debug!(caster = batch.caster, ability = %batch.ability, "caster gone; hits dropped");
                continue;
            };
            let raw = ability_damage(batch.base_damage, &stats, batch.weapon);
            for target in batch.targets {
                self.deal_damage(batch.caster, target, raw, batch.weapon, events);
                if batch.caster == HERO_ID {
                    self.provoke(target.id, events);
                }
            }
        }
    }

    fn deal_damage(
        &mut self,
        attacker: EntityId,
        target: Target,
        raw: u32,
        weapon: WeaponType,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(defense) = self.defender_stats(target.id) else {
            warn!(target = target.id, "hit on entity without defense; dropped");
            return;
        };
        let damage = resolve_hit(raw, &defense, weapon);
        if let Err(err) = self.take_damage(target.id, damage, weapon.is_magic()) {
            warn!(%err, "hit dropped");
            return;
        }
        events.push(CombatEvent::Hit {
            attacker,
            target: target.id,
            damage,
            position: target.position,
            is_magic: weapon.is_magic(),
        });
    }

    fn provoke(&mut self, id: EntityId, events: &mut Vec<CombatEvent>) {
        if let Some(monster) = self.monsters.get_mut(&id) {
            if let Some(change) = monster.agent.provoke() {
                events.push(CombatEvent::StateChanged { agent: id, change });
            }
        }
    }

    fn reap_dead(&mut self, events: &mut Vec<CombatEvent>) -> Vec<EntityId> {
        let mut deaths: Vec<EntityId> = self
            .monsters
            .iter()
            .filter(|(_, m)| m.health.is_dead())
            .map(|(&id, _)| id)
            .collect();

        for &id in &deaths {
            self.monsters.remove(&id);
            self.effects.cancel_owned_by(id);
            debug!(entity = id, "monster died");
            events.push(CombatEvent::Died { entity: id });
        }

        if !self.hero.is_alive() && !self.hero_reported_dead {
            self.hero_reported_dead = true;
            self.effects.cancel_owned_by(HERO_ID);
            debug!("hero died");
            events.push(CombatEvent::Died { entity: HERO_ID });
            deaths.push(HERO_ID);
        }

        deaths
    }

    /// Hash of everything that influences future ticks.
    ///
    /// Two encounters built from the same inputs and driven by the same
    /// hero actions hash equal at every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.tick.hash(&mut hasher);
        self.now_ms.hash(&mut hasher);

        self.hero.position.x.to_bits().hash(&mut hasher);
        self.hero.position.y.to_bits().hash(&mut hasher);
        self.hero.facing.hash(&mut hasher);
        self.hero.health.current.hash(&mut hasher);

        self.monsters.len().hash(&mut hasher);
        for (id, monster) in &self.monsters {
            id.hash(&mut hasher);
            monster.position.x.to_bits().hash(&mut hasher);
            monster.position.y.to_bits().hash(&mut hasher);
            monster.health.current.hash(&mut hasher);
            monster.agent.facing().hash(&mut hasher);
            monster.agent.state().hash(&mut hasher);
            monster.pending.hash(&mut hasher);
            monster.attack_ready_at_ms.hash(&mut hasher);
        }

        self.effects.len().hash(&mut hasher);
        hasher.finish()
    }

    #[cfg(feature = "debug-validation")]
    fn validate_invariants(&self) {
        let tile_size = self.tile_size();
        let mut seen = BTreeSet::new();
        for monster in self.monsters.values() {
            let tile = TileCoord::from_world(monster.position, tile_size);
            debug_assert!(seen.insert(tile), "two monsters share tile {tile:?}");
            debug_assert_eq!(
                monster.agent.preferred_distance(),
                monster.data.attack_type.preferred_distance(tile_size),
                "preferred distance drifted from attack type"
            );
            debug_assert!(
                !monster.agent.is_moving() || monster.pending.is_some(),
                "agent {} is moving without a pending step",
                monster.id
            );
        }
    }
}

impl WorldQuery for Encounter {
    fn active_targets(&self, faction: Faction) -> Vec<Target> {
        match faction {
            Faction::Hero => {
                if self.hero.is_alive() {
                    vec![self.hero_target()]
                } else {
                    Vec::new()
                }
            }
            Faction::Monster => self
                .monsters
                .values()
                .map(Monster::target)
                .filter(Target::is_hittable)
                .collect(),
        }
    }

    fn is_walkable(&self, tile: TileCoord) -> bool {
        self.grid.is_open(tile) && !self.occupied_tiles().contains(&tile)
    }
}

impl DamageSink for Encounter {
    fn take_damage(&mut self, target: EntityId, amount: u32, is_magic: bool) -> Result<()> {
        let health = if target == HERO_ID {
            &mut self.hero.health
        } else {
            &mut self
                .monsters
                .get_mut(&target)
                .ok_or(CombatError::EntityNotFound(target))?
                .health
        };
        health.apply_damage(amount);
        debug!(target, amount, is_magic, remaining = health.current, "damage applied");
        Ok(())
    }
}

impl StatProvider for Encounter {
    /// Only the hero has offensive stats. Monsters never cast abilities;
    /// their basic attacks use [`MonsterData::attack_damage`].
    fn attacker_stats(&self, actor: EntityId) -> Option<StatBundle> {
        (actor == HERO_ID).then_some(self.hero.stats)
    }

    fn defender_stats(&self, actor: EntityId) -> Option<Defense> {
        if actor == HERO_ID {
            return Some(Defense::Hero(self.hero.stats));
        }
        self.monsters.get(&actor).map(|m| m.data.defense())
    }

    fn attack_cooldown_ms(&self, actor: EntityId) -> Option<u64> {
        if actor == HERO_ID {
            return Some(self.hero.attack_cooldown_ms);
        }
        self.monsters.get(&actor).map(|m| m.data.attack_cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{AbilityDescriptor, AbilityShape};
    use crate::behavior::AggroState;

    fn goblin() -> MonsterData {
        MonsterData {
            id: "goblin".to_string(),
            name: "monster.goblin.name".to_string(),
            attack_type: AttackType::Melee,
            level: 2,
            base_damage: 8,
            armor: 4,
            health: 30,
            aggro_range_tiles: 6,
            lose_aggro_range_tiles: 10,
            attack_cooldown_ms: 1000,
            splash_radius: None,
        }
    }

    fn content() -> ContentPack {
        ContentPack {
            abilities: vec![AbilityDescriptor {
                id: "nova".to_string(),
                name: "ability.nova.name".to_string(),
                base_damage: 100,
                weapon: WeaponType::Magic,
                range_tiles: 0,
                shape: AbilityShape::Circle { radius: 48 },
                cooldown_ms: 2000,
            }],
            monsters: vec![
                goblin(),
                MonsterData {
                    id: "hexer".to_string(),
                    attack_type: AttackType::Magic,
                    splash_radius: Some(48),
                    ..goblin()
                },
            ],
        }
    }

    fn encounter() -> Encounter {
        let hero = HeroSetup {
            tile: TileCoord::new(5, 5),
            ..HeroSetup::default()
        };
        Encounter::new(CombatConfig::default(), content(), CollisionGrid::new(16, 16), hero, 1)
    }

    #[test]
    fn test_spawn_rejects_occupied_and_unknown() {
        let mut enc = encounter();
        assert!(enc.spawn_monster("goblin", TileCoord::new(5, 5)).is_err());
        assert!(matches!(
            enc.spawn_monster("dragon", TileCoord::new(1, 1)),
            Err(CombatError::UnknownMonster(_))
        ));
        let id = enc.spawn_monster("goblin", TileCoord::new(1, 1)).unwrap();
        assert!(enc.spawn_monster("goblin", TileCoord::new(1, 1)).is_err());
        assert_eq!(enc.monster(id).unwrap().health().current, 30);
    }

    #[test]
    fn test_world_query_views() {
        let mut enc = encounter();
        enc.spawn_monster("goblin", TileCoord::new(2, 2)).unwrap();
        assert_eq!(enc.active_targets(Faction::Hero).len(), 1);
        assert_eq!(enc.active_targets(Faction::Monster).len(), 1);
        assert!(!enc.is_walkable(TileCoord::new(2, 2)));
        assert!(!enc.is_walkable(TileCoord::new(5, 5)));
        assert!(!enc.is_walkable(TileCoord::new(-1, 0)));
        assert!(enc.is_walkable(TileCoord::new(3, 3)));
    }

    #[test]
    fn test_take_damage_unknown_entity() {
        let mut enc = encounter();
        assert!(matches!(
            enc.take_damage(99, 5, false),
            Err(CombatError::EntityNotFound(99))
        ));
    }

    #[test]
    fn test_player_attack_hits_and_provokes() {
        let mut enc = encounter();
        let id = enc.spawn_monster("goblin", TileCoord::new(5, 4)).unwrap();
        enc.face_hero(Facing::Up);

        let hits = enc.player_attack().unwrap();
        assert_eq!(hits, vec![id]);
        // auto = round(10*0.75 + 0 + 1*0.1) = 8; armor 4 → reduction 2
        assert_eq!(enc.monster(id).unwrap().health().current, 24);
        assert_eq!(enc.monster(id).unwrap().agent().state(), AggroState::Provoked);

        assert!(matches!(enc.player_attack(), Err(CombatError::NotReady { .. })));
    }

    #[test]
    fn test_cast_kills_and_reaps() {
        let mut enc = encounter();
        let id = enc.spawn_monster("goblin", TileCoord::new(6, 5)).unwrap();
        enc.cast("nova").unwrap();
        assert!(enc.monster(id).is_none());

        let events = enc.tick();
        assert_eq!(events.deaths, vec![id]);
        assert!(events.events.contains(&CombatEvent::Died { entity: id }));
        assert!(matches!(enc.cast("nova"), Err(CombatError::NotReady { .. })));
        assert!(matches!(enc.cast("meteor"), Err(CombatError::UnknownAbility(_))));
    }

    #[test]
    fn test_monster_closes_in_and_attacks() {
        let mut enc = encounter();
        let id = enc.spawn_monster("goblin", TileCoord::new(8, 5)).unwrap();

        let mut stepped = false;
        let mut hit = false;
        for _ in 0..60 {
            for event in enc.tick().events {
                match event {
                    CombatEvent::Stepped { agent, .. } if agent == id => stepped = true,
                    CombatEvent::Hit { attacker, target, .. } if attacker == id => {
                        assert_eq!(target, HERO_ID);
                        hit = true;
                    }
                    _ => {}
                }
            }
        }
        assert!(stepped);
        assert!(hit);
        assert!(enc.hero().health().current < 100);
    }

    #[test]
    fn test_state_hash_changes_with_time() {
        let mut enc = encounter();
        let before = enc.state_hash();
        enc.tick();
        assert_ne!(before, enc.state_hash());
    }

    #[test]
    fn test_only_the_hero_has_attacker_stats() {
        let mut enc = encounter();
        let id = enc.spawn_monster("goblin", TileCoord::new(1, 1)).unwrap();
        assert_eq!(enc.attacker_stats(HERO_ID), Some(HeroSetup::default().stats));
        assert_eq!(enc.attacker_stats(id), None);
        assert_eq!(enc.defender_stats(id), Some(goblin().defense()));
    }

    #[test]
    fn test_splash_never_repeats_the_primary_hit() {
        let mut enc = encounter();
        let id = enc.spawn_monster("hexer", TileCoord::new(5, 10)).unwrap();

        let mut attacks = 0;
        for _ in 0..100 {
            let hits = enc
                .tick()
                .events
                .iter()
                .filter(|e| matches!(e, CombatEvent::Hit { attacker, .. } if *attacker == id))
                .count();
            assert!(hits <= 1, "one hero, one hit per attack");
            attacks += hits;
        }
        assert!(attacks > 0);
    }

    #[test]
    fn test_distant_monster_on_wide_map_stays_dormant() {
        let hero = HeroSetup {
            tile: TileCoord::new(0, 0),
            ..HeroSetup::default()
        };
        let mut enc = Encounter::new(CombatConfig::default(), content(), CollisionGrid::new(1600, 1), hero, 1);
        let id = enc.spawn_monster("goblin", TileCoord::new(1500, 0)).unwrap();
        for _ in 0..200 {
            enc.tick();
        }
        let goblin = enc.monster(id).unwrap();
        assert_eq!(goblin.agent().state(), AggroState::Dormant);
        assert_eq!(goblin.health().current, 30);
        assert_eq!(enc.hero().health().current, 100);
    }
}
