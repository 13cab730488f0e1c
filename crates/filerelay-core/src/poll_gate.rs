//! Per-folder poll serialization
//!
//! Deleting the previous file and matching the next one are two separate
//! remote round trips, so two pollers on the same folder could double
//! delete or skip a file. [`PollGate`] hands out one async mutex per
//! (server address, folder) key; holding its guard makes a poll exclusive
//! for that folder within the process.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::trace;

/// Registry of per-folder locks
///
/// An entry lives only while a poll holds or waits for it.
#[derive(Debug, Default)]
pub struct PollGate {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Exclusive right to poll one folder, released on drop
#[derive(Debug)]
pub struct PollPermit<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    key: String,
    lock: Arc<Mutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for PollPermit<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // One reference in the map and one here: nobody else is waiting.
        let removed = self.locks.remove_if(&self.key, |_, lock| {
            Arc::ptr_eq(lock, &self.lock) && Arc::strong_count(lock) == 2
        });
        if removed.is_some() {
            trace!(key = %self.key, "Released idle poll gate entry");
        }
    }
}

impl PollGate {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Waits until no other poll holds the same folder.
    pub async fn enter(&self, server_address: &str, folder: &str) -> PollPermit<'_> {
        let key = Self::key(server_address, folder);
        let lock = {
            let entry = self.locks.entry(key.clone()).or_default();
            Arc::clone(entry.value())
        };
        trace!(key = %key, "Waiting for poll gate");
        let guard = Arc::clone(&lock).lock_owned().await;
        PollPermit {
            locks: &self.locks,
            key,
            lock,
            guard: Some(guard),
        }
    }

    /// Number of folders currently being polled or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    fn key(server_address: &str, folder: &str) -> String {
        format!("{server_address}\u{0}{folder}")
    }
}
