//! MySpots CLI
//!
//! Command-line interface for MySpots - personal points-of-interest catalog
//! with KML export.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use myspots_core::Config;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "myspots")]
#[command(about = "MySpots - catalog places you care about and export them to KML")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the places API and add selected results to the store
    AddPlace {
        /// Search query
        #[arg(short = 'Q', long)]
        query: String,
        /// Location to search around (gets geocoded)
        #[arg(short, long)]
        location: Option<String>,
        /// Radius around the location, in meters
        #[arg(short, long)]
        radius: Option<u32>,
        /// Add every search result without prompting for a selection
        #[arg(long)]
        all: bool,
    },
    /// Export the catalog as KML
    Export {
        /// Disable per-category styling; every marker gets the fallback pin
        #[arg(long)]
        no_styles: bool,
        /// Start every folder hidden (the root document stays visible)
        #[arg(long)]
        default_invisible: bool,
        /// Nest folders by category parent/child relation
        #[arg(long)]
        hierarchical: bool,
        /// Sort places oldest-first for stable marker order across runs
        #[arg(long)]
        oldest_first: bool,
        /// Write KML here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (google_api_key, airtable_api_key, airtable_base_id, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Initialize logging if MYSPOTS_LOG is set
///
/// Logs go to stderr so stdout stays clean for KML output.
fn init_logging() {
    let Ok(log_level) = std::env::var("MYSPOTS_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "myspots_core={},myspots_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need credentials
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, &output)
            }
        };
    }

    let config = Config::load()?;

    match cli.command {
        Commands::AddPlace {
            query,
            location,
            radius,
            all,
        } => commands::place::add(&config, query, location, radius, all, &output).await,
        Commands::Export {
            no_styles,
            default_invisible,
            hierarchical,
            oldest_first,
            output: output_path,
        } => {
            let args = commands::export::ExportArgs {
                no_styles,
                default_invisible,
                hierarchical,
                oldest_first,
                output_path,
            };
            commands::export::run(&config, args, &output).await
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}
