//! Poll command - run one poll against a remote folder
//!
//! The printed next token must be passed back with `--token` on the next
//! call; until then the delivered file stays on the server.

use anyhow::Result;
use clap::Args;
use filerelay_core::domain::{FileType, PollOutcome, PollRequest, ResumptionToken};
use filerelay_core::usecases::TransportOrchestrator;

use super::{fail, Invocation};
use crate::output::{get_formatter, OutputFormatter};

#[derive(Debug, Args)]
pub struct PollCommand {
    /// Remote folder (relative to the configured root)
    pub folder: String,

    /// Token returned by the previous poll
    #[arg(long, default_value = "")]
    pub token: String,

    /// Include mask, e.g. "*.xml"
    #[arg(long, default_value = "*")]
    pub include: String,

    /// Exclude mask
    #[arg(long)]
    pub exclude: Option<String>,

    /// Return the content base64-encoded
    #[arg(long)]
    pub binary: bool,
}

impl PollCommand {
    pub fn request(&self) -> PollRequest {
        let file_type = if self.binary {
            FileType::Binary
        } else {
            FileType::Text
        };
        PollRequest::new(&self.folder, ResumptionToken::from(self.token.as_str()))
            .with_masks(&self.include, self.exclude.clone())
            .with_file_type(file_type)
    }

    pub async fn execute(&self, inv: &Invocation) -> Result<()> {
        let formatter = get_formatter(inv.format);
        let orchestrator = inv.orchestrator();

        let outcome = orchestrator
            .poll(self.request())
            .await
            .map_err(|e| fail(formatter.as_ref(), e))?;

        if inv.format.is_json() {
            formatter.print_json(&serde_json::to_value(&outcome)?);
        } else {
            print_human(formatter.as_ref(), &orchestrator, &self.folder, &outcome);
        }
        Ok(())
    }
}

fn print_human(
    formatter: &dyn OutputFormatter,
    orchestrator: &TransportOrchestrator,
    folder: &str,
    outcome: &PollOutcome,
) {
    match outcome {
        PollOutcome::Delivered {
            document,
            next_token,
        } => {
            formatter.success(&format!("Delivered {}", document.descriptor.file_path()));
            formatter.info(&format!("Next token: {}", next_token));
            if let Some(content) = &document.payload.content {
                formatter.info("");
                println!("{content}");
            }
        }
        PollOutcome::NoEvent { .. } => {
            formatter.info(&format!(
                "No matching files in {}",
                orchestrator.resolve(folder)
            ));
        }
    }
}
