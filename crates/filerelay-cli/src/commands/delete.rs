//! Delete command

use anyhow::Result;
use clap::Args;

use super::{fail, Invocation};
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Remote folder (relative to the configured root)
    pub folder: String,

    /// Remote file name
    pub file_name: String,
}

impl DeleteCommand {
    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        let formatter = get_formatter(inv.format);
        let orchestrator = inv.orchestrator();

        orchestrator
            .delete(&self.folder, &self.file_name)
            .await
            .map_err(|e| fail(formatter.as_ref(), e))?;

        if inv.format.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "folderPath": orchestrator.resolve(&self.folder),
                "fileName": self.file_name,
            }));
        } else if !inv.quiet {
            formatter.success(&format!("Deleted {}/{}", self.folder, self.file_name));
        }
        Ok(())
    }
}
