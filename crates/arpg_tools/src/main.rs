//! ARPG Combat - Development Tools

use std::path::PathBuf;
use std::process::ExitCode;

use arpg_core::config::CombatConfig;
use arpg_core::data::ContentPack;
use arpg_tools::simulate::{self, SimulateOptions};
use arpg_tools::validate::{self, CONFIG_FILE, CONTENT_FILE};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "arpg-tools")]
#[command(about = "Development tools for the ARPG combat engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate data files
    Validate {
        /// Path to data directory
        #[arg(default_value = "assets/data")]
        path: PathBuf,
    },
    /// Run a headless encounter and print a summary
    Simulate {
        /// Path to data directory
        #[arg(long, default_value = "assets/data")]
        data: PathBuf,
        /// Number of ticks to run
        #[arg(long, default_value_t = 600)]
        ticks: u64,
        /// Encounter seed
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Distance in tiles from the hero to each monster
        #[arg(long, default_value_t = 5)]
        spawn_distance: i32,
    },
}

fn simulate(data: &std::path::Path, options: &SimulateOptions) -> arpg_tools::Result<String> {
    let content = ContentPack::load(data.join(CONTENT_FILE))?;
    let config_path = data.join(CONFIG_FILE);
    let config = if config_path.is_file() {
        CombatConfig::load(&config_path)?
    } else {
        CombatConfig::default()
    };
    simulate::run(content, config, options)?.to_ron()
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating data files in: {}", path.display());
            match validate::validate_data_directory(&path) {
                Ok(report) => {
                    tracing::info!(
                        abilities = report.abilities,
                        monsters = report.monsters,
                        custom_config = report.custom_config,
                        "Validation passed"
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Simulate {
            data,
            ticks,
            seed,
            spawn_distance,
        } => {
            let options = SimulateOptions {
                ticks,
                seed,
                spawn_distance,
            };
            match simulate(&data, &options) {
                Ok(report) => {
                    println!("{report}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::error!("Simulation failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
