//! venmic - route application audio into a virtual microphone.
//!
//! Thin command line front end over the PipeWire patchbay.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use venmic_core::{Config, load_config, load_config_from};

mod commands;
mod signals;

#[derive(Parser, Debug)]
#[command(name = "venmic")]
#[command(author, version, about = "Route application audio into a PipeWire virtual microphone", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List audio streams and their properties
    List(commands::ListArgs),

    /// Link matching streams into the virtual microphone until interrupted
    Link(commands::LinkArgs),

    /// Exit with status 0 if a PipeWire server is reachable
    HasPipewire,
}

fn load(path: Option<&PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config_from(path),
        None => load_config(),
    };
    config.context("Failed to load configuration")
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load(cli.config.as_ref())?;
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting venmic");

    match cli.command {
        Commands::List(args) => commands::list(config, args).await,
        Commands::Link(args) => commands::link(config, args).await,
        Commands::HasPipewire => commands::has_pipewire().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_link() {
        let cli = Cli::try_parse_from([
            "venmic", "link", "--key", "application.name", "--value", "Firefox", "--mode", "exclude",
        ])
        .unwrap();

        match cli.command {
            Commands::Link(args) => {
                assert_eq!(args.key, "application.name");
                assert_eq!(args.value, "Firefox");
                assert_eq!(args.mode, "exclude");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_list_with_keys() {
        let cli = Cli::try_parse_from(["venmic", "--config", "/tmp/v.toml", "list", "node.name", "--json"]).unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/v.toml")));
        match cli.command {
            Commands::List(args) => {
                assert_eq!(args.keys, vec!["node.name".to_string()]);
                assert!(args.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_link_mode_defaults_to_include() {
        let cli = Cli::try_parse_from(["venmic", "link", "--key", "k", "--value", "v"]).unwrap();
        assert!(matches!(cli.command, Commands::Link(args) if args.mode == "include"));
    }
}
