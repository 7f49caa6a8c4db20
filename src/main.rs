use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use layer_presets::cache::create_cache;
use layer_presets::core::{init_logging, LogLevel, PresetConfig, SourceSpec};

/// CLI arguments parser
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the presets for a preset type or layer id
    Show {
        /// Preset type or layer id
        id: String,

        /// Apply the default preset if the layer has not received one yet
        #[arg(short, long)]
        apply_default: bool,
    },

    /// Register preset files for a type and print the merged list
    Fetch {
        /// Preset type
        preset_type: String,

        /// Preset file urls, oldest first
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PresetConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => PresetConfig::default(),
    };

    let level = if cli.verbose { LogLevel::Debug } else { config.log_level };
    init_logging(level, cli.verbose);

    let id = match &cli.command {
        Commands::Show { id, .. } => id.clone(),
        Commands::Fetch { preset_type, urls } => {
            config.sources.extend(urls.iter().map(|url| SourceSpec {
                preset_type: preset_type.clone(),
                url: url.clone(),
            }));
            preset_type.clone()
        }
    };
    let apply_default = matches!(cli.command, Commands::Show { apply_default: true, .. });

    debug!("Loading presets for {}", id);
    let cache = create_cache(&config).await?;
    let presets = cache.get_presets(&id, apply_default).await;

    println!("{}", serde_json::to_string_pretty(presets.as_ref())?);
    cache.dispose().await;
    Ok(())
}
