//! Additive damage and mitigation formulas.
//!
//! This module implements the damage pipeline:
//! - Attacker stats add a flat bonus on top of weapon or ability damage
//! - Defenders subtract a flat reduction derived from armor
//! - Magic damage bypasses armor entirely
//! - Every hit deals at least [`MIN_DAMAGE`]
//!
//! All math runs on integers in hundredths so that `round()` is exact.
//! Coefficients are expressed as percentages:
//!
//! ```text
//! bonus     = power × 75% + skill(weapon) × 15% + level × 10%
//! auto      = round(bonus)
//! ability   = round(base + bonus)
//! monster   = round(base + monster_level × 50%)
//! hero_def  = round(armor × 75% + (shield ? shield_skill × 15% : 0) + level × 10%)
//! mon_def   = round(monster_armor × 50%)
//! final     = magic ? raw : raw - reduction      (never below 1)
//! ```

use serde::{Deserialize, Serialize};

/// Minimum damage floor - attacks always deal at least 1 damage.
pub const MIN_DAMAGE: u32 = 1;

/// Power contribution to offensive bonus and armor contribution to defense.
pub const POWER_PERCENT: u64 = 75;
/// Skill level contribution (weapon skill on offense, shield skill on defense).
pub const SKILL_PERCENT: u64 = 15;
/// Character level contribution.
pub const LEVEL_PERCENT: u64 = 10;
/// Monster level contribution to monster damage.
pub const MONSTER_LEVEL_PERCENT: u64 = 50;
/// Monster armor contribution to monster damage reduction.
pub const MONSTER_ARMOR_PERCENT: u64 = 50;

/// Weapon or skill key used by an attack.
///
/// Whether an attack is magic is a property of this key alone, never of
/// the numbers involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum WeaponType {
    /// Swords, axes, fists.
    #[default]
    Melee,
    /// Bows and thrown weapons.
    Archery,
    /// Staves and spells.
    Magic,
}

impl WeaponType {
    /// Magic damage ignores armor.
    #[must_use]
    pub const fn is_magic(self) -> bool {
        matches!(self, WeaponType::Magic)
    }
}

/// Skill levels trained by the equipment/skill subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SkillLevels {
    /// Melee weapon skill.
    pub melee: u32,
    /// Archery skill.
    pub archery: u32,
    /// Magic skill.
    pub magic: u32,
    /// Shield skill, counted only while a shield is equipped.
    pub shield: u32,
}

impl SkillLevels {
    /// Skill level for a weapon type.
    #[must_use]
    pub const fn for_weapon(&self, weapon: WeaponType) -> u32 {
        match weapon {
            WeaponType::Melee => self.melee,
            WeaponType::Archery => self.archery,
            WeaponType::Magic => self.magic,
        }
    }
}

/// Snapshot of an actor's aggregated combat attributes.
///
/// Owned by the equipment/skill subsystem; the combat engine only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBundle {
    /// Offensive power from equipment.
    pub power: u32,
    /// Armor from equipment.
    pub armor: u32,
    /// Character level.
    pub level: u32,
    /// Trained skills.
    pub skills: SkillLevels,
    /// Whether a shield is currently equipped.
    pub shield_equipped: bool,
}

impl StatBundle {
    /// Create a stat bundle with no skills and no shield.
    #[must_use]
    pub const fn new(power: u32, armor: u32, level: u32) -> Self {
        Self {
            power,
            armor,
            level,
            skills: SkillLevels {
                melee: 0,
                archery: 0,
                magic: 0,
                shield: 0,
            },
            shield_equipped: false,
        }
    }

    /// Builder method to set skill levels.
    #[must_use]
    pub const fn with_skills(mut self, skills: SkillLevels) -> Self {
        self.skills = skills;
        self
    }

    /// Builder method to equip a shield.
    #[must_use]
    pub const fn with_shield(mut self, equipped: bool) -> Self {
        self.shield_equipped = equipped;
        self
    }

    /// Offensive bonus in hundredths of a point.
    fn offense_hundredths(&self, weapon: WeaponType) -> u64 {
        self.power as u64 * POWER_PERCENT
            + self.skills.for_weapon(weapon) as u64 * SKILL_PERCENT
            + self.level as u64 * LEVEL_PERCENT
    }
}

/// Defensive side of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Defense {
    /// Equipment-driven defense of the player character.
    Hero(StatBundle),
    /// Flat monster armor.
    Monster {
        /// Armor value from content data.
        armor: u32,
    },
}

impl Defense {
    /// Flat damage reduction this defense provides.
    #[must_use]
    pub fn reduction(&self) -> u32 {
        match self {
            Defense::Hero(stats) => player_damage_reduction(stats),
            Defense::Monster { armor } => monster_damage_reduction(*armor),
        }
    }
}

/// Round a non-negative value in hundredths to the nearest integer, halves up.
#[inline]
fn round_hundredths(hundredths: u64) -> u32 {
    u32::try_from((hundredths + 50) / 100).unwrap_or(u32::MAX)
}

/// Damage of a basic weapon attack.
///
/// `round(power × 0.75 + skill(weapon) × 0.15 + level × 0.10)`, at least 1.
#[must_use]
pub fn auto_attack_damage(attacker: &StatBundle, weapon: WeaponType) -> u32 {
    round_hundredths(attacker.offense_hundredths(weapon)).max(MIN_DAMAGE)
}

/// Damage of an ability: its base damage plus the attacker's bonus, at least 1.
#[must_use]
pub fn ability_damage(base_damage: u32, attacker: &StatBundle, weapon: WeaponType) -> u32 {
    let hundredths = base_damage as u64 * 100 + attacker.offense_hundredths(weapon);
    round_hundredths(hundredths).max(MIN_DAMAGE)
}

/// Damage of a monster attack: `round(base + level × 0.5)`, at least 1.
#[must_use]
pub fn monster_damage(base_damage: u32, monster_level: u32) -> u32 {
    let hundredths = base_damage as u64 * 100 + monster_level as u64 * MONSTER_LEVEL_PERCENT;
    round_hundredths(hundredths).max(MIN_DAMAGE)
}

/// Flat reduction from the player's armor, shield skill and level.
///
/// Shield skill only counts while a shield is equipped.
#[must_use]
pub fn player_damage_reduction(defender: &StatBundle) -> u32 {
    let shield = if defender.shield_equipped {
        defender.skills.shield as u64 * SKILL_PERCENT
    } else {
        0
    };
    let hundredths =
        defender.armor as u64 * POWER_PERCENT + shield + defender.level as u64 * LEVEL_PERCENT;
    round_hundredths(hundredths)
}

/// Flat reduction from monster armor: `round(armor × 0.5)`.
#[must_use]
pub fn monster_damage_reduction(monster_armor: u32) -> u32 {
    round_hundredths(monster_armor as u64 * MONSTER_ARMOR_PERCENT)
}

/// Apply a reduction to raw damage.
///
/// Magic ignores the reduction entirely. The result is never below
/// [`MIN_DAMAGE`].
#[must_use]
pub fn apply_reduction(raw_damage: u32, reduction: u32, is_magic: bool) -> u32 {
    if is_magic {
        raw_damage.max(MIN_DAMAGE)
    } else {
        raw_damage.saturating_sub(reduction).max(MIN_DAMAGE)
    }
}

/// Final damage of a hit against `defense` with `weapon`.
#[must_use]
pub fn resolve_hit(raw_damage: u32, defense: &Defense, weapon: WeaponType) -> u32 {
    apply_reduction(raw_damage, defense.reduction(), weapon.is_magic())
}
