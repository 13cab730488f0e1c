//! Config command - view and validate filerelay configuration

use anyhow::{Context, Result};
use clap::Subcommand;
use filerelay_core::config::Config;
use tracing::info;

use super::Invocation;
use crate::output::get_formatter;

const REDACTED: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current configuration
    Show,
    /// Validate configuration file
    Validate,
}

impl ConfigCommand {
    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(inv),
            ConfigCommand::Validate => execute_validate(inv),
        }
    }
}

fn execute_show(inv: &Invocation) -> Result<()> {
    let formatter = get_formatter(inv.format);
    let config = redacted(&inv.config);

    info!(config_path = %inv.config_path.display(), "Showing configuration");

    if inv.format.is_json() {
        let json =
            serde_json::to_value(&config).context("Failed to serialize configuration to JSON")?;
        formatter.print_json(&json);
    } else {
        formatter.success(&format!("Configuration ({})", inv.config_path.display()));
        formatter.info("");

        let yaml =
            serde_yaml::to_string(&config).context("Failed to serialize configuration to YAML")?;
        for line in yaml.lines() {
            formatter.info(line);
        }
    }
    Ok(())
}

fn execute_validate(inv: &Invocation) -> Result<()> {
    let formatter = get_formatter(inv.format);

    if !inv.config_path.exists() {
        formatter.warn(&format!(
            "{} does not exist, validating defaults",
            inv.config_path.display()
        ));
    }

    let errors = inv.config.validate();
    if inv.format.is_json() {
        let details: Vec<_> = errors
            .iter()
            .map(|e| serde_json::json!({"field": e.field, "message": e.message}))
            .collect();
        formatter.print_json(&serde_json::json!({
            "valid": errors.is_empty(),
            "config_path": inv.config_path.display().to_string(),
            "errors": details,
        }));
    } else if errors.is_empty() {
        formatter.success("Configuration is valid");
    } else {
        formatter.error(&format!("{} configuration error(s)", errors.len()));
        for e in &errors {
            formatter.info(&format!("{}: {}", e.field, e.message));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("configuration is invalid")
    }
}

/// Copy of `config` with credentials masked.
fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.transport.password.is_some() {
        config.transport.password = Some(REDACTED.to_string());
    }
    if config.transport.private_key_passphrase.is_some() {
        config.transport.private_key_passphrase = Some(REDACTED.to_string());
    }
    config
}
