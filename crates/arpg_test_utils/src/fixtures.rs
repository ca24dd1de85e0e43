//! Test fixtures and helpers.
//!
//! Pre-built content, arenas and encounters for consistent testing.

use arpg_core::ability::{AbilityDescriptor, AbilityShape};
use arpg_core::behavior::AttackType;
use arpg_core::components::{EntityId, Faction, Target};
use arpg_core::config::CombatConfig;
use arpg_core::damage::{StatBundle, WeaponType};
use arpg_core::data::{ContentPack, MonsterData};
use arpg_core::encounter::{Encounter, HeroSetup};
use arpg_core::math::{TileCoord, Vec2Fixed};
use arpg_core::world::CollisionGrid;
use fixed::types::I32F32;

/// Tile size used by every fixture.
pub const TILE: i32 = 32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In engine code, never build positions from floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// World position from integer coordinates.
#[must_use]
pub fn pos(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_int(x, y)
}

/// Center of tile `(x, y)` at the fixture tile size.
#[must_use]
pub fn tile_center(x: i32, y: i32) -> Vec2Fixed {
    TileCoord::new(x, y).center(fixed(TILE))
}

/// A living, active monster target at a world position.
#[must_use]
pub fn monster_at(id: EntityId, x: i32, y: i32) -> Target {
    Target::new(id, Faction::Monster, pos(x, y))
}

/// A living, active hero target at a world position.
#[must_use]
pub fn hero_at(id: EntityId, x: i32, y: i32) -> Target {
    Target::new(id, Faction::Hero, pos(x, y))
}

fn monster(id: &str, attack_type: AttackType, health: u32, splash_radius: Option<u32>) -> MonsterData {
    MonsterData {
        id: id.to_string(),
        name: format!("monster.{id}.name"),
        attack_type,
        level: 2,
        base_damage: 8,
        armor: 4,
        health,
        aggro_range_tiles: 6,
        lose_aggro_range_tiles: 10,
        attack_cooldown_ms: 1000,
        splash_radius,
    }
}

fn ability(id: &str, base_damage: u32, weapon: WeaponType, range_tiles: u32, shape: AbilityShape) -> AbilityDescriptor {
    AbilityDescriptor {
        id: id.to_string(),
        name: format!("ability.{id}.name"),
        base_damage,
        weapon,
        range_tiles,
        shape,
        cooldown_ms: 1000,
    }
}

/// Content pack with one of each attack type and shape.
///
/// Monsters: `goblin` (melee), `archer` (ranged), `warlock` (magic with
/// splash). Abilities: `cleave` (pattern), `nova` (circle), `lance`
/// (line), `frost_wave` (wave).
#[must_use]
pub fn sample_content() -> ContentPack {
    ContentPack {
        abilities: vec![
            ability(
                "cleave",
                12,
                WeaponType::Melee,
                1,
                AbilityShape::Pattern(vec![(-1, -1), (0, -1), (1, -1)]),
            ),
            ability("nova", 20, WeaponType::Magic, 0, AbilityShape::Circle { radius: 48 }),
            ability("lance", 15, WeaponType::Archery, 5, AbilityShape::Line { half_width: 8 }),
            ability(
                "frost_wave",
                18,
                WeaponType::Magic,
                0,
                AbilityShape::Wave {
                    arc_degrees: 90,
                    min_radius: 0,
                    max_radius: 160,
                    step: 32,
                    interval_ms: 100,
                },
            ),
        ],
        monsters: vec![
            monster("goblin", AttackType::Melee, 30, None),
            monster("archer", AttackType::Ranged, 24, None),
            monster("warlock", AttackType::Magic, 20, Some(48)),
        ],
    }
}

/// [`sample_content`] as pretty RON text.
///
/// # Panics
///
/// Panics if the pack cannot be serialized.
#[must_use]
pub fn sample_content_ron() -> String {
    ron::ser::to_string_pretty(&sample_content(), ron::ser::PrettyConfig::default())
        .expect("sample content serializes")
}

/// Open square arena with a wall ring around the edge.
#[must_use]
pub fn walled_arena(size: u32) -> CollisionGrid {
    let mut rows = Vec::with_capacity(size as usize);
    for y in 0..size {
        let row: String = (0..size)
            .map(|x| {
                if x == 0 || y == 0 || x == size - 1 || y == size - 1 {
                    '#'
                } else {
                    '.'
                }
            })
            .collect();
        rows.push(row);
    }
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    CollisionGrid::from_rows(&refs)
}

/// Hero standing on `tile` with modest stats.
#[must_use]
pub fn hero_on(x: i32, y: i32) -> HeroSetup {
    HeroSetup {
        tile: TileCoord::new(x, y),
        stats: StatBundle::new(20, 6, 3),
        weapon: WeaponType::Melee,
        max_health: 200,
        attack_cooldown_ms: 500,
    }
}

/// A 16x16 walled arena with the hero in the middle and no monsters.
#[must_use]
pub fn empty_encounter(seed: u64) -> Encounter {
    Encounter::new(
        CombatConfig::default(),
        sample_content(),
        walled_arena(16),
        hero_on(8, 8),
        seed,
    )
}

/// [`empty_encounter`] plus one monster of each type around the hero.
///
/// # Panics
///
/// Panics if the fixture spawn tiles are taken.
#[must_use]
pub fn skirmish(seed: u64) -> Encounter {
    let mut encounter = empty_encounter(seed);
    for (kind, x, y) in [("goblin", 3, 8), ("archer", 12, 4), ("warlock", 8, 13)] {
        encounter
            .spawn_monster(kind, TileCoord::new(x, y))
            .expect("fixture spawn tile is free");
    }
    encounter
}
