//! Persisted resumption tokens, one per trigger
//!
//! The state file is rewritten through a temporary sibling and a rename so
//! a crash never leaves a truncated file behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use filerelay_core::domain::ResumptionToken;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerState {
    pub token: ResumptionToken,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default)]
    triggers: BTreeMap<String, TriggerState>,
}

/// Token store shared by all trigger workers
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<StateFile>,
}

impl TokenStore {
    /// Opens the store at `path`; a missing file starts empty.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse state file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StateFile::default(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read state file {}", path.display()))
            }
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last recorded token for `trigger`, empty when none.
    pub async fn token(&self, trigger: &str) -> ResumptionToken {
        self.state
            .lock()
            .await
            .triggers
            .get(trigger)
            .map(|s| s.token.clone())
            .unwrap_or_default()
    }

    pub async fn get(&self, trigger: &str) -> Option<TriggerState> {
        self.state.lock().await.triggers.get(trigger).cloned()
    }

    /// Records `token` for `trigger` and persists the store.
    ///
    /// Returns `false` without touching the file when the token is unchanged.
    /// When the write fails the previous token stays in effect.
    pub async fn record(&self, trigger: &str, token: ResumptionToken) -> Result<bool> {
        let mut state = self.state.lock().await;
        if state.triggers.get(trigger).map(|s| &s.token) == Some(&token) {
            return Ok(false);
        }
        if token.is_empty() && !state.triggers.contains_key(trigger) {
            return Ok(false);
        }

        let mut next = StateFile {
            triggers: state.triggers.clone(),
        };
        next.triggers.insert(
            trigger.to_string(),
            TriggerState {
                token,
                updated_at: Utc::now(),
            },
        );
        self.persist(&next).await?;
        *state = next;
        Ok(true)
    }

    async fn persist(&self, state: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create state directory")?;
        }
        let json = serde_json::to_vec_pretty(state).context("Failed to serialize state")?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Persisted trigger state");
        Ok(())
    }
}
