//! Whole-encounter behaviour: ordering, exclusivity and teardown.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use arpg_core::prelude::*;
use arpg_test_utils::determinism::{run_script, verify_determinism, HeroAction};
use arpg_test_utils::fixtures::{empty_encounter, hero_on, sample_content, skirmish, walled_arena};

struct Recorder(Rc<RefCell<Vec<CombatEvent>>>);

impl CombatObserver for Recorder {
    fn on_event(&mut self, event: &CombatEvent) -> std::result::Result<(), ObserverError> {
        self.0.borrow_mut().push(event.clone());
        Ok(())
    }
}

struct Broken;

impl CombatObserver for Broken {
    fn on_event(&mut self, _event: &CombatEvent) -> std::result::Result<(), ObserverError> {
        Err(ObserverError::new("broken", "always fails"))
    }
}

#[test]
fn test_same_seed_same_fight() {
    verify_determinism(3, 300, || skirmish(42), |e| { e.tick(); }, Encounter::state_hash)
        .assert_deterministic();
}

#[test]
fn test_scripted_fight_replays_identically() {
    let script = vec![
        (0, HeroAction::Face(Facing::Left)),
        (1, HeroAction::Cast("frost_wave".to_string())),
        (30, HeroAction::Step(Facing::Up)),
        (31, HeroAction::Attack),
        (60, HeroAction::Cast("nova".to_string())),
    ];
    let a = run_script(&mut skirmish(8), &script, 200);
    let b = run_script(&mut skirmish(8), &script, 200);
    assert_eq!(a, b);
}

#[test]
fn test_steps_never_overlap() {
    let mut encounter = skirmish(17);
    let step_ticks = encounter.config().step_duration_ms / TICK_DURATION_MS;
    let mut last_step: BTreeMap<EntityId, u64> = BTreeMap::new();

    for _ in 0..400 {
        let events = encounter.tick();
        for event in events.events {
            if let CombatEvent::Stepped { agent, .. } = event {
                let tick = encounter.tick_count();
                if let Some(previous) = last_step.insert(agent, tick) {
                    assert!(
                        tick - previous >= step_ticks,
                        "agent {agent} stepped at {previous} and again at {tick}"
                    );
                }
            }
        }
    }
    assert!(!last_step.is_empty());
}

#[test]
fn test_monsters_never_share_tiles() {
    let mut encounter = skirmish(23);
    let tile = encounter.config().tile_size_fixed();
    for _ in 0..400 {
        encounter.tick();
        let mut claimed = BTreeSet::new();
        claimed.insert(TileCoord::from_world(encounter.hero().position(), tile));
        for monster in encounter.monsters() {
            assert!(claimed.insert(TileCoord::from_world(monster.position(), tile)));
            if let Some(destination) = monster.step_destination() {
                assert!(claimed.insert(destination));
            }
        }
    }
}

#[test]
fn test_wave_strikes_each_target_once() {
    let mut encounter = empty_encounter(1);
    let goblin = encounter.spawn_monster("goblin", TileCoord::new(10, 8)).unwrap();
    encounter.face_hero(Facing::Right);
    encounter.cast("frost_wave").unwrap();

    let mut hits = 0;
    for _ in 0..20 {
        for event in encounter.tick().events {
            if let CombatEvent::Hit { attacker: HERO_ID, target, is_magic, .. } = event {
                assert!(is_magic);
                if target == goblin {
                    hits += 1;
                }
            }
        }
    }
    assert_eq!(hits, 1);
    assert!(encounter.effects().is_empty());
}

#[test]
fn test_wave_skips_targets_behind_caster() {
    let mut encounter = empty_encounter(1);
    let behind = encounter.spawn_monster("goblin", TileCoord::new(6, 8)).unwrap();
    encounter.face_hero(Facing::Right);
    encounter.cast("frost_wave").unwrap();

    for _ in 0..20 {
        for event in encounter.tick().events {
            assert!(!matches!(
                event,
                CombatEvent::Hit { attacker: HERO_ID, target, .. } if target == behind
            ));
        }
    }
}

#[test]
fn test_hero_death_cancels_effects_and_blocks_actions() {
    let hero = HeroSetup {
        max_health: 1,
        ..hero_on(8, 8)
    };
    let mut encounter = Encounter::new(CombatConfig::default(), sample_content(), walled_arena(16), hero, 5);
    encounter.spawn_monster("goblin", TileCoord::new(7, 8)).unwrap();
    encounter.face_hero(Facing::Right);
    encounter.cast("frost_wave").unwrap();
    assert_eq!(encounter.effects().len(), 1);

    let events = encounter.tick();
    assert_eq!(events.deaths, vec![HERO_ID]);
    assert!(events.events.contains(&CombatEvent::Died { entity: HERO_ID }));
    assert!(encounter.effects().is_empty());
    assert!(matches!(encounter.player_attack(), Err(CombatError::EntityDead(HERO_ID))));
    assert!(!encounter.hero_step(Facing::Up));
}

#[test]
fn test_provoked_monster_engages_from_afar() {
    let content = ContentPack {
        abilities: vec![AbilityDescriptor {
            id: "lance".to_string(),
            name: "ability.lance.name".to_string(),
            base_damage: 1,
            weapon: WeaponType::Archery,
            range_tiles: 12,
            shape: AbilityShape::Line { half_width: 8 },
            cooldown_ms: 0,
        }],
        ..sample_content()
    };
    let mut encounter = Encounter::new(CombatConfig::default(), content, CollisionGrid::new(32, 32), hero_on(2, 2), 9);
    let archer = encounter.spawn_monster("archer", TileCoord::new(11, 2)).unwrap();
    encounter.face_hero(Facing::Right);
    encounter.cast("lance").unwrap();

    let state = encounter.monster(archer).unwrap().agent().state();
    assert_eq!(state, AggroState::Provoked);

    let events = encounter.tick();
    assert!(events.events.contains(&CombatEvent::StateChanged {
        agent: archer,
        change: BehaviorChange::AggroAcquired,
    }));
    assert!(events.events.iter().any(|e| matches!(
        e,
        CombatEvent::Stepped { agent, facing: Facing::Left, .. } if *agent == archer
    )));
}

#[test]
fn test_observers_see_every_event_despite_failures() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut encounter = skirmish(4);
    encounter.subscribe(Box::new(Broken));
    encounter.subscribe(Box::new(Recorder(Rc::clone(&log))));

    let mut returned = Vec::new();
    for _ in 0..100 {
        returned.extend(encounter.tick().events);
    }
    assert_eq!(*log.borrow(), returned);
}

#[test]
fn test_cooldowns_gate_abilities() {
    let mut encounter = empty_encounter(2);
    encounter.cast("nova").unwrap();
    match encounter.cast("nova") {
        Err(CombatError::NotReady { action, ready_in_ms }) => {
            assert_eq!(action, "nova");
            assert_eq!(ready_in_ms, 1000);
        }
        other => panic!("expected cooldown rejection, got {other:?}"),
    }
    for _ in 0..20 {
        encounter.tick();
    }
    assert!(encounter.cast("nova").is_ok());
}
