//! The data shipped in `assets/data` must always validate and run.

use std::path::PathBuf;

use arpg_core::config::CombatConfig;
use arpg_core::data::ContentPack;
use arpg_tools::simulate::{run, SimulateOptions};
use arpg_tools::validate::{validate_data_directory, CONFIG_FILE, CONTENT_FILE};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/data")
}

#[test]
fn test_shipped_data_validates() {
    let report = validate_data_directory(&data_dir()).unwrap();
    assert!(report.abilities > 0);
    assert!(report.monsters > 0);
    assert!(report.custom_config);
}

#[test]
fn test_shipped_config_matches_defaults() {
    let config = CombatConfig::load(data_dir().join(CONFIG_FILE)).unwrap();
    assert_eq!(config, CombatConfig::default());
}

#[test]
fn test_shipped_content_runs() {
    let content = ContentPack::load(data_dir().join(CONTENT_FILE)).unwrap();
    let options = SimulateOptions {
        ticks: 400,
        seed: 12,
        ..SimulateOptions::default()
    };
    let summary = run(content, CombatConfig::default(), &options).unwrap();
    assert!(summary.ticks > 0);
}
