//! filerelay - command-line front end for the document transfer connector
//!
//! Provides commands for:
//! - Uploading, downloading and deleting single files
//! - Listing a remote folder
//! - Running one poll against a watched folder
//! - Showing and validating the configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use filerelay_core::config::{Config, LoggingConfig};
use filerelay_core::usecases::TransferError;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    config::ConfigCommand, delete::DeleteCommand, download::DownloadCommand, list::ListCommand,
    poll::PollCommand, upload::UploadCommand, Invocation,
};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "filerelay",
    version,
    about = "Move documents to and from SFTP drop folders"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Upload a file to a remote folder
    Upload(UploadCommand),
    /// Download a file from a remote folder
    Download(DownloadCommand),
    /// Delete a remote file
    Delete(DeleteCommand),
    /// List the entries of a remote folder
    List(ListCommand),
    /// Poll a remote folder once for the next matching file
    Poll(PollCommand),
    /// View and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Level filter from the verbosity flags, falling back to the configured level.
fn log_filter(verbose: u8, quiet: bool, logging: &LoggingConfig) -> String {
    match (quiet, verbose) {
        (true, _) => "warn".to_string(),
        (false, 0) => logging.level.clone(),
        (false, 1) => "debug".to_string(),
        (false, _) => "trace".to_string(),
    }
}

fn init_tracing(cli: &Cli, logging: &LoggingConfig) {
    let filter = log_filter(cli.verbose, cli.quiet, logging);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let formatter = get_formatter(format);

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = match commands::load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            std::process::exit(1);
        }
    };

    init_tracing(&cli, &config.logging);

    let invocation = Invocation {
        config_path,
        config,
        format,
        quiet: cli.quiet,
    };

    let result = match &cli.command {
        Commands::Upload(cmd) => cmd.execute(&invocation).await,
        Commands::Download(cmd) => cmd.execute(&invocation).await,
        Commands::Delete(cmd) => cmd.execute(&invocation).await,
        Commands::List(cmd) => cmd.execute(&invocation).await,
        Commands::Poll(cmd) => cmd.execute(&invocation).await,
        Commands::Config(cmd) => cmd.execute(&invocation).await,
    };

    if let Err(e) = result {
        // Transfer failures were already reported with their category.
        if !e.is::<TransferError>() {
            formatter.error(&format!("{e:#}"));
        }
        std::process::exit(1);
    }
    Ok(())
}
