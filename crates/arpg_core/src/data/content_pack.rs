//! The full set of abilities and monsters loaded at startup.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::monster_data::MonsterData;
use crate::ability::{AbilityDescriptor, AbilityShape};
use crate::error::{CombatError, Result};

/// Complete content definition.
///
/// # Example RON
///
/// ```ron
/// ContentPack(
///     abilities: [...],
///     monsters: [...],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPack {
    /// Every ability the hero can cast.
    #[serde(default)]
    pub abilities: Vec<AbilityDescriptor>,

    /// Every monster type that can spawn.
    #[serde(default)]
    pub monsters: Vec<MonsterData>,
}

impl ContentPack {
    /// Parse and validate a content pack from RON text.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::DataParseError`] for malformed RON and
    /// [`CombatError::InvalidData`] listing every validation problem.
    pub fn from_ron_str(source: &str, label: &str) -> Result<Self> {
        let pack: Self = ron::from_str(source).map_err(|e| CombatError::DataParseError {
            path: label.to_string(),
            message: e.to_string(),
        })?;

        let errors = pack.validate();
        if !errors.is_empty() {
            return Err(CombatError::InvalidData {
                kind: "content",
                id: label.to_string(),
                reason: errors.join("; "),
            });
        }
        Ok(pack)
    }

    /// Read, parse and validate a content file.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::Io`] if the file cannot be read, otherwise the
    /// errors of [`ContentPack::from_ron_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let label = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| CombatError::Io {
            path: label.clone(),
            source,
        })?;
        Self::from_ron_str(&source, &label)
    }

    /// Find an ability by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownAbility`] if no ability has this id.
    pub fn ability(&self, id: &str) -> Result<&AbilityDescriptor> {
        self.abilities
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| CombatError::UnknownAbility(id.to_string()))
    }

    /// Find a monster by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::UnknownMonster`] if no monster has this id.
    pub fn monster(&self, id: &str) -> Result<&MonsterData> {
        self.monsters
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| CombatError::UnknownMonster(id.to_string()))
    }

    /// Validate internal consistency of the pack.
    ///
    /// Checks for:
    /// - Duplicate ability and monster ids
    /// - Ability shapes that can never hit anything
    /// - Per-monster problems (see [`MonsterData::validate`])
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = BTreeSet::new();
        for ability in &self.abilities {
            if !seen.insert(ability.id.as_str()) {
                errors.push(format!("Duplicate ability id '{}'", ability.id));
            }
            errors.extend(validate_shape(ability));
        }

        let mut seen = BTreeSet::new();
        for monster in &self.monsters {
            if !seen.insert(monster.id.as_str()) {
                errors.push(format!("Duplicate monster id '{}'", monster.id));
            }
            errors.extend(monster.validate());
        }

        errors
    }
}

fn validate_shape(ability: &AbilityDescriptor) -> Option<String> {
    let problem = match &ability.shape {
        AbilityShape::Pattern(pattern) if pattern.is_empty() => "has an empty tile pattern",
        AbilityShape::Line { .. } if ability.range_tiles == 0 => "is a line with zero range",
        AbilityShape::Wave {
            arc_degrees,
            min_radius,
            max_radius,
            step,
            ..
        } => {
            if *arc_degrees == 0 || *arc_degrees > 360 {
                "has a wave arc outside 1..=360 degrees"
            } else if min_radius >= max_radius {
                "has a wave whose min radius is not below its max radius"
            } else if *step == 0 {
                "has a wave that never expands"
            } else {
                return None;
            }
        }
        _ => return None,
    };
    Some(format!("Ability '{}' {problem}", ability.id))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"
ContentPack(
    abilities: [
        AbilityDescriptor(
            id: "cleave",
            name: "ability.cleave.name",
            base_damage: 12,
            weapon: Melee,
            range_tiles: 1,
            shape: Pattern([(-1, -1), (0, -1), (1, -1)]),
            cooldown_ms: 1500,
        ),
        AbilityDescriptor(
            id: "frost_wave",
            name: "ability.frost_wave.name",
            base_damage: 18,
            weapon: Magic,
            range_tiles: 4,
            shape: Wave(arc_degrees: 90, min_radius: 0, max_radius: 128, step: 32, interval_ms: 100),
        ),
    ],
    monsters: [
        MonsterData(
            id: "goblin",
            name: "monster.goblin.name",
            attack_type: Melee,
            level: 2,
            base_damage: 8,
            health: 30,
            aggro_range_tiles: 6,
            lose_aggro_range_tiles: 10,
            attack_cooldown_ms: 1000,
        ),
    ],
)
"#;

    #[test]
    fn test_parse_pack() {
        let pack = ContentPack::from_ron_str(PACK, "inline").unwrap();
        assert_eq!(pack.abilities.len(), 2);
        assert_eq!(pack.ability("frost_wave").unwrap().cooldown_ms, 0);
        assert!(pack.ability("frost_wave").unwrap().is_magic());
        assert_eq!(pack.monster("goblin").unwrap().armor, 0);
    }

    #[test]
    fn test_unknown_lookups() {
        let pack = ContentPack::from_ron_str(PACK, "inline").unwrap();
        assert!(matches!(pack.ability("fireball"), Err(CombatError::UnknownAbility(_))));
        assert!(matches!(pack.monster("dragon"), Err(CombatError::UnknownMonster(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut pack = ContentPack::from_ron_str(PACK, "inline").unwrap();
        pack.monsters.push(pack.monsters[0].clone());
        pack.abilities.push(pack.abilities[0].clone());
        let errors = pack.validate();
        assert_eq!(errors.len(), 2, "Errors: {errors:?}");
    }

    #[test]
    fn test_bad_wave_rejected() {
        let mut pack = ContentPack::from_ron_str(PACK, "inline").unwrap();
        pack.abilities[1].shape = AbilityShape::Wave {
            arc_degrees: 90,
            min_radius: 64,
            max_radius: 64,
            step: 32,
            interval_ms: 100,
        };
        let errors = pack.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("frost_wave"));
    }

    #[test]
    fn test_invalid_pack_reports_all_problems() {
        let source = PACK.replace("health: 30", "health: 0");
        let err = ContentPack::from_ron_str(&source, "content.ron").unwrap_err();
        match err {
            CombatError::InvalidData { kind, reason, .. } => {
                assert_eq!(kind, "content");
                assert!(reason.contains("zero health"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_ron() {
        let err = ContentPack::from_ron_str("ContentPack(abilities: 3)", "bad.ron").unwrap_err();
        assert!(matches!(err, CombatError::DataParseError { .. }));
    }
}
