//! Monster definitions for data-driven spawning.

use serde::{Deserialize, Serialize};

use crate::behavior::{AgentProfile, AttackType};
use crate::damage::{monster_damage, Defense};
use crate::math::Fixed;

/// Data-driven monster definition.
///
/// # Example RON
///
/// ```ron
/// MonsterData(
///     id: "skeleton_archer",
///     name: "monster.skeleton_archer.name",
///     attack_type: Ranged,
///     level: 4,
///     base_damage: 9,
///     armor: 6,
///     health: 40,
///     aggro_range_tiles: 7,
///     lose_aggro_range_tiles: 11,
///     attack_cooldown_ms: 1400,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterData {
    /// Unique string identifier for this monster type.
    pub id: String,

    /// Localization key for the display name.
    pub name: String,

    /// Attack style; fixes the preferred distance.
    pub attack_type: AttackType,

    /// Monster level, adds half a point of damage per level.
    pub level: u32,

    /// Damage per attack before the level bonus.
    pub base_damage: u32,

    /// Armor; halved into a flat reduction.
    #[serde(default)]
    pub armor: u32,

    /// Maximum health points.
    pub health: u32,

    /// Distance in tiles at which the monster notices the hero.
    pub aggro_range_tiles: u32,

    /// Distance in tiles beyond which the monster gives up.
    pub lose_aggro_range_tiles: u32,

    /// Time between attacks.
    pub attack_cooldown_ms: u64,

    /// Splash radius around the struck target for ranged and magic attacks.
    ///
    /// Splash strikes other hero-faction targets near the primary one and
    /// never the primary twice. An encounter with a single hero therefore
    /// gets no extra hits from it; it matters to hosts that field several.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub splash_radius: Option<u32>,
}

impl MonsterData {
    /// Behavior profile for agents of this type.
    #[must_use]
    pub fn profile(&self, tile_size: Fixed) -> AgentProfile {
        AgentProfile::from_tiles(
            self.attack_type,
            self.aggro_range_tiles,
            self.lose_aggro_range_tiles,
            tile_size,
        )
    }

    /// Raw damage of one attack.
    #[must_use]
    pub fn attack_damage(&self) -> u32 {
        monster_damage(self.base_damage, self.level)
    }

    /// Defensive side when this monster is struck.
    #[must_use]
    pub const fn defense(&self) -> Defense {
        Defense::Monster { armor: self.armor }
    }

    /// Consistency problems with this definition.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.health == 0 {
            errors.push(format!("Monster '{}' has zero health", self.id));
        }
        if self.lose_aggro_range_tiles < self.aggro_range_tiles {
            errors.push(format!(
                "Monster '{}' loses aggro ({} tiles) inside its aggro range ({} tiles)",
                self.id, self.lose_aggro_range_tiles, self.aggro_range_tiles
            ));
        }
        if self.splash_radius.is_some() && self.attack_type == AttackType::Melee {
            errors.push(format!("Monster '{}' is melee but has a splash radius", self.id));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_monster() -> MonsterData {
        MonsterData {
            id: "goblin".to_string(),
            name: "monster.goblin.name".to_string(),
            attack_type: AttackType::Melee,
            level: 3,
            base_damage: 10,
            armor: 7,
            health: 30,
            aggro_range_tiles: 6,
            lose_aggro_range_tiles: 10,
            attack_cooldown_ms: 1000,
            splash_radius: None,
        }
    }

    #[test]
    fn test_attack_damage_includes_level() {
        // 10 + 3 * 0.5 = 11.5 → 12
        assert_eq!(create_test_monster().attack_damage(), 12);
    }

    #[test]
    fn test_defense_halves_armor() {
        assert_eq!(create_test_monster().defense().reduction(), 4);
    }

    #[test]
    fn test_profile_in_world_units() {
        let profile = create_test_monster().profile(Fixed::from_num(32));
        assert_eq!(profile.aggro_range, Fixed::from_num(192));
        assert_eq!(profile.lose_aggro_range, Fixed::from_num(320));
    }

    #[test]
    fn test_validate() {
        assert!(create_test_monster().validate().is_empty());

        let mut broken = create_test_monster();
        broken.health = 0;
        broken.lose_aggro_range_tiles = 2;
        broken.splash_radius = Some(16);
        assert_eq!(broken.validate().len(), 3);
    }
}
