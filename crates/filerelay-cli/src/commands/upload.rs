//! Upload command - place one file in a remote folder

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use filerelay_core::domain::{PayloadEnvelope, TransferEncoding};
use filerelay_core::usecases::UploadOptions;
use tracing::info;

use super::{encoding_for, fail, Invocation};
use crate::output::get_formatter;

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Remote destination folder (relative to the configured root)
    pub folder: String,

    /// Remote file name
    pub file_name: String,

    /// Read the payload from a local file
    #[arg(long, conflicts_with = "content")]
    pub file: Option<PathBuf>,

    /// Inline payload; base64 text when combined with --binary
    #[arg(long)]
    pub content: Option<String>,

    /// Transfer the payload as base64-encoded bytes
    #[arg(long)]
    pub binary: bool,

    /// Append to the remote file instead of replacing it
    #[arg(long)]
    pub append: bool,

    /// Upload into this folder first, then move into place
    #[arg(long)]
    pub staging: Option<String>,
}

impl UploadCommand {
    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        let formatter = get_formatter(inv.format);
        let payload = self.payload().await?;

        let orchestrator = inv.orchestrator();
        let options = UploadOptions {
            append_if_exists: self.append,
            staging_folder: self.staging.clone(),
        };

        info!(folder = %self.folder, file_name = %self.file_name, "Uploading file");
        let descriptor = orchestrator
            .upload(&self.folder, &self.file_name, payload, options)
            .await
            .map_err(|e| fail(formatter.as_ref(), e))?;

        if inv.format.is_json() {
            formatter.print_json(&serde_json::to_value(&descriptor)?);
        } else if !inv.quiet {
            formatter.success(&format!(
                "Uploaded {} to {}",
                descriptor.file_path(),
                descriptor.server_address()
            ));
        }
        Ok(())
    }

    /// Builds the payload envelope from `--file` or `--content`.
    async fn payload(&self) -> Result<PayloadEnvelope> {
        let encoding = encoding_for(self.binary);
        match (&self.file, &self.content) {
            (Some(path), _) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                PayloadEnvelope::from_bytes(&bytes, encoding).with_context(|| {
                    format!("{} is not valid UTF-8, use --binary", path.display())
                })
            }
            (None, Some(content)) => Ok(match encoding {
                TransferEncoding::Base64 => PayloadEnvelope::base64(content.clone()),
                TransferEncoding::None => PayloadEnvelope::text(content.clone()),
            }),
            (None, None) => bail!("Either --file or --content is required"),
        }
    }
}
