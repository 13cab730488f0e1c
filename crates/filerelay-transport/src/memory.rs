//! In-memory backend
//!
//! Keeps folders and files in process memory. Listings come back in
//! insertion order, which makes it the reference store for poll ordering
//! tests. Faults can be injected per path (permission denied, failing
//! downloads) and every remote operation is counted.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use filerelay_core::domain::remote_path;
use filerelay_core::ports::{BackendError, ITransportBackend, ITransportSession, RemoteEntry};
use tracing::trace;

#[derive(Debug, Default)]
struct StoreState {
    folders: BTreeSet<String>,
    /// (path, content) in insertion order
    files: Vec<(String, Vec<u8>)>,
    denied: HashSet<String>,
    broken_downloads: HashSet<String>,
    dropped_downloads: HashSet<String>,
}

impl StoreState {
    fn folder_exists(&self, folder: &str) -> bool {
        folder.is_empty() || folder == "/" || self.folders.contains(folder)
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|(p, _)| p == path)
    }

    fn check_access(&self, path: &str) -> Result<(), BackendError> {
        let denied = self
            .denied
            .iter()
            .any(|prefix| path == prefix || path.starts_with(&format!("{prefix}/")));
        if denied {
            return Err(BackendError::PermissionDenied(path.to_string()));
        }
        Ok(())
    }

    fn store(&mut self, path: &str, content: Vec<u8>) {
        match self.position(path) {
            Some(idx) => self.files[idx].1 = content,
            None => self.files.push((path.to_string(), content)),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    state: Mutex<StoreState>,
    remote_calls: AtomicUsize,
    connects: AtomicUsize,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, BackendError> {
        self.state
            .lock()
            .map_err(|_| BackendError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn normalize(path: &str) -> String {
    let path = remote_path::normalize_separators(path);
    match path.trim_end_matches('/') {
        "" if path.starts_with('/') => "/".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Backend keeping everything in memory
///
/// Clones share the same store, so a test can keep one handle for
/// inspection while the orchestrator owns another.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    server_address: String,
    store: Arc<MemoryStore>,
}

impl MemoryBackend {
    pub fn new(server_address: impl Into<String>) -> Self {
        Self {
            server_address: server_address.into(),
            store: Arc::new(MemoryStore::default()),
        }
    }

    /// Creates `folder` and all its parents.
    pub fn create_folder(&self, folder: &str) {
        let folder = normalize(folder);
        if let Ok(mut state) = self.store.lock() {
            let mut current = String::new();
            for part in folder.split('/') {
                if part.is_empty() {
                    if current.is_empty() && folder.starts_with('/') {
                        current.push('/');
                    }
                    continue;
                }
                current = remote_path::combine(&current, part);
                state.folders.insert(current.clone());
            }
        }
    }

    /// Stores a file, creating its folder.
    pub fn put_file(&self, path: &str, content: impl Into<Vec<u8>>) {
        let path = normalize(path);
        let (folder, _) = remote_path::split(&path);
        self.create_folder(&folder);
        if let Ok(mut state) = self.store.lock() {
            state.store(&path, content.into());
        }
    }

    pub fn read_file(&self, path: &str) -> Option<Vec<u8>> {
        let path = normalize(path);
        let state = self.store.lock().ok()?;
        state
            .position(&path)
            .map(|idx| state.files[idx].1.clone())
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.read_file(path).is_some()
    }

    /// Names of the files directly inside `folder`, in insertion order.
    pub fn file_names(&self, folder: &str) -> Vec<String> {
        let folder = normalize(folder);
        let Ok(state) = self.store.lock() else {
            return Vec::new();
        };
        state
            .files
            .iter()
            .filter_map(|(path, _)| {
                let (parent, name) = remote_path::split(path);
                (parent == folder).then_some(name)
            })
            .collect()
    }

    /// Every operation on `path` or below fails with permission denied.
    pub fn deny(&self, path: &str) {
        if let Ok(mut state) = self.store.lock() {
            state.denied.insert(normalize(path));
        }
    }

    /// Downloads of `path` fail with a remote error.
    pub fn break_download(&self, path: &str) {
        if let Ok(mut state) = self.store.lock() {
            state.broken_downloads.insert(normalize(path));
        }
    }

    /// Downloads of `path` fail as if the connection had dropped.
    pub fn drop_connection_on_download(&self, path: &str) {
        if let Ok(mut state) = self.store.lock() {
            state.dropped_downloads.insert(normalize(path));
        }
    }

    /// Number of session operations performed so far.
    pub fn remote_calls(&self) -> usize {
        self.store.remote_calls.load(Ordering::SeqCst)
    }

    /// Number of sessions opened so far.
    pub fn connects(&self) -> usize {
        self.store.connects.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ITransportBackend for MemoryBackend {
    fn server_address(&self) -> &str {
        &self.server_address
    }

    async fn connect(&self) -> Result<Box<dyn ITransportSession>, BackendError> {
        self.store.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            store: Arc::clone(&self.store),
        }))
    }
}

/// Session over a shared [`MemoryBackend`] store
#[derive(Debug)]
pub struct MemorySession {
    store: Arc<MemoryStore>,
}

impl MemorySession {
    fn begin(&self, op: &str, path: &str) -> Result<MutexGuard<'_, StoreState>, BackendError> {
        self.store.remote_calls.fetch_add(1, Ordering::SeqCst);
        trace!(op, path, "Memory backend call");
        let state = self.store.lock()?;
        state.check_access(path)?;
        Ok(state)
    }
}

fn local_io(err: std::io::Error) -> BackendError {
    BackendError::Unavailable(format!("local I/O failure: {err}"))
}

#[async_trait::async_trait]
impl ITransportSession for MemorySession {
    async fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let path = normalize(path);
        let state = self.begin("exists", &path)?;
        Ok(state.position(&path).is_some())
    }

    async fn upload(&self, local: &Path, remote: &str, overwrite: bool) -> Result<(), BackendError> {
        let remote = normalize(remote);
        let content = tokio::fs::read(local).await.map_err(local_io)?;

        let mut state = self.begin("upload", &remote)?;
        let (folder, _) = remote_path::split(&remote);
        if !state.folder_exists(&folder) {
            return Err(BackendError::NotFound(folder));
        }
        if !overwrite && state.position(&remote).is_some() {
            return Err(BackendError::Other(format!("{remote} already exists")));
        }
        state.store(&remote, content);
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<(), BackendError> {
        let remote = normalize(remote);
        let content = {
            let state = self.begin("download", &remote)?;
            if state.broken_downloads.contains(&remote) {
                return Err(BackendError::Other(format!("{remote}: read failed")));
            }
            if state.dropped_downloads.contains(&remote) {
                return Err(BackendError::Unavailable(format!(
                    "{remote}: connection reset"
                )));
            }
            let idx = state
                .position(&remote)
                .ok_or_else(|| BackendError::NotFound(remote.clone()))?;
            state.files[idx].1.clone()
        };
        tokio::fs::write(local, content).await.map_err(local_io)
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let path = normalize(path);
        let mut state = self.begin("delete", &path)?;
        let idx = state
            .position(&path)
            .ok_or_else(|| BackendError::NotFound(path.clone()))?;
        state.files.remove(idx);
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let from = normalize(from);
        let to = normalize(to);
        let mut state = self.begin("rename", &from)?;
        state.check_access(&to)?;

        let idx = state
            .position(&from)
            .ok_or_else(|| BackendError::NotFound(from.clone()))?;
        let (folder, _) = remote_path::split(&to);
        if !state.folder_exists(&folder) {
            return Err(BackendError::NotFound(to));
        }
        if state.position(&to).is_some() {
            return Err(BackendError::Other(format!("{to} already exists")));
        }
        state.files[idx].0 = to;
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, BackendError> {
        let folder = normalize(path);
        let state = self.begin("list", &folder)?;
        if !state.folder_exists(&folder) {
            return Err(BackendError::NotFound(folder));
        }

        let mut entries = vec![RemoteEntry::directory("."), RemoteEntry::directory("..")];
        entries.extend(state.folders.iter().filter_map(|f| {
            let (parent, name) = remote_path::split(f);
            (parent == folder && !name.is_empty()).then(|| RemoteEntry::directory(name))
        }));
        entries.extend(state.files.iter().filter_map(|(p, _)| {
            let (parent, name) = remote_path::split(p);
            (parent == folder).then(|| RemoteEntry::file(name))
        }));
        Ok(entries)
    }
}
