//! SocialCue CLI: run the presence pipeline headless over scripted scenes.
//!
//! Usage:
//!   socialcue simulate <SCENE>   Run a scene and summarize the cues produced
//!   socialcue config             Print the effective configuration
//!   socialcue validate <SCENE>   Check a scene file and the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use socialcue_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "socialcue",
    about = "Non-visual social presence cues for shared virtual spaces",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted scene through the presence pipeline
    Simulate {
        /// Path to the scene JSON file
        scene: PathBuf,

        /// Seconds to simulate (defaults to the scene's duration)
        #[arg(short, long)]
        duration: Option<f64>,

        /// Write every emitted cue to this JSONL file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Pace ticks and the caption timer in wall-clock time
        #[arg(long)]
        realtime: bool,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Print built-in defaults instead
        #[arg(long)]
        default: bool,
    },

    /// Validate a scene file and lint the configuration
    Validate {
        /// Path to the scene JSON file
        scene: PathBuf,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AppConfig> {
    match path {
        Some(path) => AppConfig::from_path(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display())),
        None => Ok(AppConfig::load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    socialcue_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Simulate {
            scene,
            duration,
            log,
            realtime,
        } => commands::simulate::run(config, scene, duration, log, realtime).await,
        Commands::Config { default } => commands::config::run(config, default),
        Commands::Validate { scene } => commands::validate::run(&config, scene),
    }
}
