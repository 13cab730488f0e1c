//! List command - show the entries of a remote folder

use anyhow::Result;
use clap::Args;

use super::{fail, Invocation};
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct ListCommand {
    /// Remote folder (relative to the configured root)
    pub folder: String,
}

impl ListCommand {
    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        let formatter = get_formatter(inv.format);
        let orchestrator = inv.orchestrator();

        let entries = orchestrator
            .list(&self.folder)
            .await
            .map_err(|e| fail(formatter.as_ref(), e))?;

        if inv.format.is_json() {
            formatter.print_json(&serde_json::to_value(&entries)?);
            return Ok(());
        }

        if entries.is_empty() {
            if !inv.quiet {
                formatter.success(&format!("{} is empty", orchestrator.resolve(&self.folder)));
            }
            return Ok(());
        }

        if !inv.quiet {
            formatter.success(&format!(
                "{} entries in {}",
                entries.len(),
                orchestrator.resolve(&self.folder)
            ));
        }
        for entry in &entries {
            println!("{}", entry.file_name());
        }
        Ok(())
    }
}
