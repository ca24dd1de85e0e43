//! Data validation utilities.

use std::path::Path;

use arpg_core::config::CombatConfig;
use arpg_core::data::ContentPack;
use tracing::{info, warn};

use crate::{Result, ToolError};

/// Content file name inside a data directory.
pub const CONTENT_FILE: &str = "content.ron";

/// Optional tuning file name inside a data directory.
pub const CONFIG_FILE: &str = "combat.ron";

/// What a data directory contains once validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of abilities defined.
    pub abilities: usize,
    /// Number of monster types defined.
    pub monsters: usize,
    /// Whether a tuning file was present; defaults apply otherwise.
    pub custom_config: bool,
}

/// Validate the content pack and tuning file in a directory.
///
/// The content file is required; the tuning file is optional.
///
/// # Errors
///
/// Returns [`ToolError::MissingFile`] without a content file, or the
/// parse/validation error of the first file that fails.
pub fn validate_data_directory(path: &Path) -> Result<ValidationReport> {
    let content_path = path.join(CONTENT_FILE);
    if !content_path.is_file() {
        return Err(ToolError::MissingFile(content_path));
    }
    let pack = ContentPack::load(&content_path)?;
    info!(
        abilities = pack.abilities.len(),
        monsters = pack.monsters.len(),
        "content pack ok"
    );

    let config_path = path.join(CONFIG_FILE);
    let custom_config = config_path.is_file();
    if custom_config {
        CombatConfig::load(&config_path)?;
        info!("combat config ok");
    } else {
        warn!(path = %config_path.display(), "no combat config; defaults apply");
    }

    Ok(ValidationReport {
        abilities: pack.abilities.len(),
        monsters: pack.monsters.len(),
        custom_config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arpg_core::error::CombatError;
    use arpg_test_utils::fixtures::sample_content_ron;

    #[test]
    fn test_missing_content_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ToolError::MissingFile(_))
        ));
    }

    #[test]
    fn test_valid_directory_without_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONTENT_FILE), sample_content_ron()).unwrap();
        let report = validate_data_directory(dir.path()).unwrap();
        assert_eq!(report.abilities, 4);
        assert_eq!(report.monsters, 3);
        assert!(!report.custom_config);
    }

    #[test]
    fn test_bad_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONTENT_FILE), sample_content_ron()).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "CombatConfig(tile_size: 0)").unwrap();
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(ToolError::Combat(CombatError::InvalidData { .. }))
        ));
    }
}
