//! Download command - fetch one remote file

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::{encoding_for, fail, Invocation};
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Remote folder (relative to the configured root)
    pub folder: String,

    /// Remote file name
    pub file_name: String,

    /// Return the content base64-encoded
    #[arg(long)]
    pub binary: bool,

    /// Write the decoded content to this local file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DownloadCommand {
    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        let formatter = get_formatter(inv.format);
        let orchestrator = inv.orchestrator();

        let document = orchestrator
            .download(&self.folder, &self.file_name, encoding_for(self.binary))
            .await
            .map_err(|e| fail(formatter.as_ref(), e))?;

        if let Some(path) = &self.output {
            let bytes = document.payload.to_bytes()?;
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), bytes = bytes.len(), "Saved download");

            if inv.format.is_json() {
                formatter.print_json(&serde_json::json!({
                    "file": document.descriptor,
                    "savedTo": path.display().to_string(),
                    "bytes": bytes.len(),
                }));
            } else if !inv.quiet {
                formatter.success(&format!(
                    "Downloaded {} ({} bytes) to {}",
                    document.descriptor.file_path(),
                    bytes.len(),
                    path.display()
                ));
            }
            return Ok(());
        }

        if inv.format.is_json() {
            formatter.print_json(&serde_json::to_value(&document)?);
        } else {
            print!("{}", document.payload.content.as_deref().unwrap_or_default());
        }
        Ok(())
    }
}
