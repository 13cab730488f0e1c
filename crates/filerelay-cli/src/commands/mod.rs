//! CLI subcommands
//!
//! Every transfer command loads the configuration, builds the configured
//! backend and runs one orchestrator call.

pub mod config;
pub mod delete;
pub mod download;
pub mod list;
pub mod poll;
pub mod upload;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use filerelay_core::config::Config;
use filerelay_core::domain::{FileType, TransferEncoding};
use filerelay_core::usecases::{TransferError, TransportOrchestrator};
use filerelay_transport::backend_from_config;
use tracing::debug;

use crate::output::{OutputFormat, OutputFormatter};

/// Everything a command needs from the global flags.
pub struct Invocation {
    pub config_path: PathBuf,
    pub config: Config,
    pub format: OutputFormat,
    pub quiet: bool,
}

impl Invocation {
    pub fn orchestrator(&self) -> TransportOrchestrator {
        build_orchestrator(&self.config)
    }
}

/// Loads `path`, or the defaults when the file does not exist.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        debug!(config_path = %path.display(), "No configuration file, using defaults");
        return Ok(Config::default());
    }
    Config::load(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Builds the orchestrator for the configured transport.
pub fn build_orchestrator(config: &Config) -> TransportOrchestrator {
    TransportOrchestrator::new(
        backend_from_config(&config.transport),
        config.transport.root_folder.clone(),
        config.scratch_area(),
    )
}

/// Encoding for `--binary` flags.
pub fn encoding_for(binary: bool) -> TransferEncoding {
    let file_type = if binary {
        FileType::Binary
    } else {
        FileType::Text
    };
    file_type.transfer_encoding()
}

/// Prints a transfer failure and turns it into the command's error.
pub fn fail(formatter: &dyn OutputFormatter, err: TransferError) -> anyhow::Error {
    formatter.transfer_failure(&err);
    anyhow::Error::new(err)
}
