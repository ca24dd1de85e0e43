//! Headless encounter runs.
//!
//! Spawns one monster of every type in the content pack in a ring around
//! a stationary hero who attacks and casts whenever able, then reports
//! what happened. Useful for eyeballing balance changes.

use std::cell::RefCell;
use std::rc::Rc;

use arpg_core::components::{EntityId, Facing};
use arpg_core::config::CombatConfig;
use arpg_core::data::ContentPack;
use arpg_core::encounter::{Encounter, HeroSetup, HERO_ID};
use arpg_core::error::CombatError;
use arpg_core::events::{CombatEvent, CombatObserver, ObserverError};
use arpg_core::math::TileCoord;
use arpg_core::world::CollisionGrid;
use serde::Serialize;
use tracing::{debug, info};

use crate::Result;

/// Side length of the generated arena in tiles.
pub const ARENA_SIZE: u32 = 24;

/// Parameters of a headless run.
#[derive(Debug, Clone)]
pub struct SimulateOptions {
    /// Number of ticks to run.
    pub ticks: u64,
    /// Encounter seed.
    pub seed: u64,
    /// Distance in tiles from the hero to each spawned monster.
    pub spawn_distance: i32,
}

impl Default for SimulateOptions {
    fn default() -> Self {
        Self {
            ticks: 600,
            seed: 0,
            spawn_distance: 5,
        }
    }
}

/// Outcome of a headless run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationSummary {
    /// Ticks actually run; stops early once one side is wiped out.
    pub ticks: u64,
    /// Hits landed by the hero.
    pub hero_hits: u32,
    /// Damage dealt by the hero.
    pub damage_dealt: u64,
    /// Hits landed on the hero.
    pub monster_hits: u32,
    /// Damage taken by the hero.
    pub damage_taken: u64,
    /// Monsters killed.
    pub kills: u32,
    /// Whether the hero survived.
    pub hero_survived: bool,
    /// State hash at the end of the run.
    pub final_hash: u64,
}

impl SimulationSummary {
    fn record(&mut self, event: &CombatEvent) {
        match *event {
            CombatEvent::Hit {
                attacker, damage, ..
            } if attacker == HERO_ID => {
                self.hero_hits += 1;
                self.damage_dealt += u64::from(damage);
            }
            CombatEvent::Hit { target, damage, .. } if target == HERO_ID => {
                self.monster_hits += 1;
                self.damage_taken += u64::from(damage);
            }
            CombatEvent::Died { entity } if entity != HERO_ID => self.kills += 1,
            _ => {}
        }
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ToolError::Render`] if serialization fails.
    pub fn to_ron(&self) -> Result<String> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}

/// Observer that writes every event to the log.
#[derive(Debug, Default)]
pub struct TraceObserver {
    seen: Rc<RefCell<u64>>,
}

impl TraceObserver {
    /// Create an observer and a handle to its event counter.
    #[must_use]
    pub fn new() -> (Self, Rc<RefCell<u64>>) {
        let seen = Rc::new(RefCell::new(0));
        (Self { seen: Rc::clone(&seen) }, seen)
    }
}

impl CombatObserver for TraceObserver {
    fn on_event(&mut self, event: &CombatEvent) -> std::result::Result<(), ObserverError> {
        *self.seen.borrow_mut() += 1;
        debug!(?event, "combat event");
        Ok(())
    }
}

/// Ring of spawn tiles around `center`, one per entry, clockwise from up.
fn spawn_ring(center: TileCoord, distance: i32, count: usize) -> Vec<TileCoord> {
    let ring = [
        (0, -distance),
        (distance, -distance),
        (distance, 0),
        (distance, distance),
        (0, distance),
        (-distance, distance),
        (-distance, 0),
        (-distance, -distance),
    ];
    ring.iter()
        .cycle()
        .enumerate()
        .take(count)
        .map(|(i, &(dx, dy))| {
            // Further laps move one tile outward.
            let lap = (i / ring.len()) as i32;
            center.offset(dx + dx.signum() * lap, dy + dy.signum() * lap)
        })
        .collect()
}

/// Facing toward the nearest living monster, if any.
fn face_nearest(encounter: &Encounter) -> Option<Facing> {
    let hero = encounter.hero().position();
    encounter
        .monsters()
        .min_by_key(|m| (m.position().distance_squared(hero), m.id()))
        .and_then(|m| Facing::toward(hero, m.position()))
}

/// Run one encounter.
///
/// # Errors
///
/// Returns an error if a monster cannot be spawned.
pub fn run(content: ContentPack, config: CombatConfig, options: &SimulateOptions) -> Result<SimulationSummary> {
    let center = TileCoord::new(ARENA_SIZE as i32 / 2, ARENA_SIZE as i32 / 2);
    let hero = HeroSetup {
        tile: center,
        ..HeroSetup::default()
    };
    let kinds: Vec<String> = content.monsters.iter().map(|m| m.id.clone()).collect();
    let abilities: Vec<String> = content.abilities.iter().map(|a| a.id.clone()).collect();

    let mut encounter = Encounter::new(
        config,
        content,
        CollisionGrid::new(ARENA_SIZE, ARENA_SIZE),
        hero,
        options.seed,
    );
    let (observer, seen) = TraceObserver::new();
    encounter.subscribe(Box::new(observer));

    let mut spawned: Vec<EntityId> = Vec::new();
    for (kind, tile) in kinds.iter().zip(spawn_ring(center, options.spawn_distance, kinds.len())) {
        spawned.push(encounter.spawn_monster(kind, tile)?);
    }
    info!(monsters = spawned.len(), seed = options.seed, "encounter ready");

    let mut summary = SimulationSummary::default();
    for _ in 0..options.ticks {
        if let Some(facing) = face_nearest(&encounter) {
            encounter.face_hero(facing);
            hero_turn(&mut encounter, &abilities);
        }

        let events = encounter.tick();
        summary.ticks += 1;
        for event in &events.events {
            summary.record(event);
        }
        if !encounter.hero().is_alive() || encounter.monsters().next().is_none() {
            break;
        }
    }

    summary.hero_survived = encounter.hero().is_alive();
    summary.final_hash = encounter.state_hash();
    info!(
        ticks = summary.ticks,
        kills = summary.kills,
        survived = summary.hero_survived,
        events = *seen.borrow(),
        "encounter finished"
    );
    Ok(summary)
}

/// Attack if ready, otherwise cast the first ready ability.
fn hero_turn(encounter: &mut Encounter, abilities: &[String]) {
    match encounter.player_attack() {
        Ok(_) => return,
        Err(CombatError::NotReady { .. }) => {}
        Err(err) => {
            debug!(%err, "attack skipped");
            return;
        }
    }
    for ability in abilities {
        if encounter.cast(ability).is_ok() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpg_test_utils::fixtures::sample_content;

    #[test]
    fn test_spawn_ring_is_distinct() {
        let tiles = spawn_ring(TileCoord::new(12, 12), 5, 10);
        let mut unique = tiles.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 10);
        assert_eq!(tiles[0], TileCoord::new(12, 7));
        assert_eq!(tiles[8], TileCoord::new(12, 6));
    }

    #[test]
    fn test_run_is_reproducible() {
        let options = SimulateOptions {
            ticks: 200,
            seed: 3,
            ..SimulateOptions::default()
        };
        let a = run(sample_content(), CombatConfig::default(), &options).unwrap();
        let b = run(sample_content(), CombatConfig::default(), &options).unwrap();
        assert_eq!(a, b);
        assert!(a.ticks > 0);
        assert!(a.hero_hits + a.monster_hits > 0);
    }

    #[test]
    fn test_summary_renders_as_ron() {
        let summary = SimulationSummary {
            ticks: 3,
            kills: 1,
            ..SimulationSummary::default()
        };
        let text = summary.to_ron().unwrap();
        assert!(text.contains("kills: 1"));
    }
}
