//! One polling loop per configured trigger
//!
//! A delivered file is written to the trigger's inbox and its token is
//! persisted before the next poll acknowledges it on the server. A crash
//! between the two steps redelivers the same file, which overwrites the
//! inbox copy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use filerelay_core::config::TriggerConfig;
use filerelay_core::domain::PollOutcome;
use filerelay_core::usecases::TransportOrchestrator;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::inbox;
use crate::state::TokenStore;

/// What a single poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// A file was written to the inbox; poll again right away.
    Delivered,
    /// Nothing matched; wait for the next interval.
    Idle,
}

pub struct TriggerWorker {
    trigger: TriggerConfig,
    orchestrator: Arc<TransportOrchestrator>,
    store: Arc<TokenStore>,
}

impl TriggerWorker {
    pub fn new(
        trigger: TriggerConfig,
        orchestrator: Arc<TransportOrchestrator>,
        store: Arc<TokenStore>,
    ) -> Self {
        Self {
            trigger,
            orchestrator,
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.trigger.name
    }

    /// Polls until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        let interval = Duration::from_secs(self.trigger.interval_secs);
        info!(
            trigger = %self.trigger.name,
            folder = %self.trigger.folder,
            interval_secs = self.trigger.interval_secs,
            "Starting trigger"
        );

        while !shutdown.is_cancelled() {
            let wait = match self.cycle().await {
                Ok(Cycle::Delivered) => continue,
                Ok(Cycle::Idle) => interval,
                Err(e) => {
                    error!(trigger = %self.trigger.name, error = %format!("{e:#}"), "Poll cycle failed");
                    interval
                }
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.cancelled() => break,
            }
        }

        info!(trigger = %self.trigger.name, "Trigger stopped");
    }

    /// Runs one poll and handles its outcome.
    #[instrument(skip(self), fields(trigger = %self.trigger.name))]
    pub async fn cycle(&self) -> Result<Cycle> {
        let token = self.store.token(&self.trigger.name).await;
        let outcome = self
            .orchestrator
            .poll(self.trigger.poll_request(token))
            .await
            .context("Poll failed")?;

        match outcome {
            PollOutcome::Delivered {
                document,
                next_token,
            } => {
                let path = inbox::deliver(&self.trigger.inbox, &document)
                    .await
                    .with_context(|| {
                        format!(
                            "Failed to write {} into {}",
                            document.descriptor.file_name(),
                            self.trigger.inbox.display()
                        )
                    })?;
                info!(
                    remote_path = %document.descriptor.file_path(),
                    local_path = %path.display(),
                    "Delivered file"
                );
                self.store
                    .record(&self.trigger.name, next_token)
                    .await
                    .context("Failed to persist resumption token")?;
                Ok(Cycle::Delivered)
            }
            PollOutcome::NoEvent { next_token } => {
                if self.store.record(&self.trigger.name, next_token).await? {
                    debug!("Cleared acknowledged token");
                }
                Ok(Cycle::Idle)
            }
        }
    }
}

/// Spawns a worker per trigger and waits for all of them to stop.
pub async fn run_all(
    triggers: &[TriggerConfig],
    orchestrator: Arc<TransportOrchestrator>,
    store: Arc<TokenStore>,
    shutdown: CancellationToken,
) {
    let mut tasks = tokio::task::JoinSet::new();
    for trigger in triggers {
        let worker = TriggerWorker::new(trigger.clone(), Arc::clone(&orchestrator), Arc::clone(&store));
        tasks.spawn(worker.run(shutdown.child_token()));
    }

    while let Some(result) = tasks.join_next().await {
        if let Err(e) = result {
            warn!(error = %e, "Trigger task ended abnormally");
        }
    }
}
