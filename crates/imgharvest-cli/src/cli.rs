use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use imgharvest::{CONFIG_FILE, ExtractStrategy};

/// Stage images from a design PDF and reconcile them with a site's asset folders.
#[derive(Debug, Parser)]
#[command(name = "imgharvest", about, version)]
pub struct Cli {
    /// Configuration file; built-in defaults are used when it does not exist
    #[arg(long, global = true, value_name = "FILE", default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the images of every page with size, placement and classification
    Images {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Extract images from the document into the staging folder
    Extract {
        /// Selection strategy. Default: the configured strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Scan site sources and list the asset paths they reference
    Scan,

    /// Copy staged images into category folders using the rule table
    Map,

    /// Fill missing referenced assets with staged images of the same name
    Automap,

    /// Delete unreferenced category images and every staged file
    Cleanup {
        /// Print the deletion plan without deleting anything
        #[arg(long)]
        dry_run: bool,
    },
}

/// Output format for the images subcommand.
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON output
    Json,
}

/// Extraction strategy.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    /// Every image, named without dimensions
    All,
    /// Flat minimum width and height
    MinSize,
    /// Minimum area, page priority and duplicate suppression
    Priority,
    /// Web mockup classifier
    Mockup,
}

impl From<StrategyArg> for ExtractStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::All => ExtractStrategy::All,
            StrategyArg::MinSize => ExtractStrategy::MinSize,
            StrategyArg::Priority => ExtractStrategy::Priority,
            StrategyArg::Mockup => ExtractStrategy::Mockup,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_config_after_subcommand() {
        let cli = Cli::parse_from(["imgharvest", "map", "--config", "site/harvest.toml"]);
        assert_eq!(cli.config, PathBuf::from("site/harvest.toml"));
        assert!(matches!(cli.command, Commands::Map));
    }

    #[test]
    fn config_defaults_to_harvest_toml() {
        let cli = Cli::parse_from(["imgharvest", "scan"]);
        assert_eq!(cli.config, PathBuf::from("harvest.toml"));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn strategy_and_verbosity() {
        let cli = Cli::parse_from(["imgharvest", "-vv", "extract", "--strategy", "min-size"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Extract { strategy } => assert_eq!(
                strategy.map(ExtractStrategy::from),
                Some(ExtractStrategy::MinSize)
            ),
            other => panic!("expected extract, got {other:?}"),
        }
    }

    #[test]
    fn cleanup_dry_run_flag() {
        let cli = Cli::parse_from(["imgharvest", "cleanup", "--dry-run"]);
        assert!(matches!(cli.command, Commands::Cleanup { dry_run: true }));
    }
}
