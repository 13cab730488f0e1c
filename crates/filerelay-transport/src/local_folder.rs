//! Local directory backend
//!
//! Serves a directory tree (typically a mounted network share) through the
//! transport port. Remote paths are interpreted relative to the base
//! directory; a leading `/` is ignored and `..` segments are refused.

use std::io;
use std::path::{Component, Path, PathBuf};

use filerelay_core::config::TransportConfig;
use filerelay_core::ports::{BackendError, ITransportBackend, ITransportSession, RemoteEntry};
use tracing::{debug, trace};

/// Backend rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalFolderBackend {
    server_address: String,
    base: Option<PathBuf>,
}

impl LocalFolderBackend {
    pub fn new(server_address: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self {
            server_address: server_address.into(),
            base: Some(base.into()),
        }
    }

    /// Backend for the `local` transport kind; a missing `local_root`
    /// surfaces as a configuration error when connecting.
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            server_address: config.server_address.clone(),
            base: config.local_root.clone(),
        }
    }
}

#[async_trait::async_trait]
impl ITransportBackend for LocalFolderBackend {
    fn server_address(&self) -> &str {
        &self.server_address
    }

    async fn connect(&self) -> Result<Box<dyn ITransportSession>, BackendError> {
        let base = self.base.clone().ok_or_else(|| {
            BackendError::Configuration("transport.local_root is not set".to_string())
        })?;

        match tokio::fs::metadata(&base).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(BackendError::Configuration(format!(
                    "{} is not a directory",
                    base.display()
                )))
            }
            Err(e) => {
                return Err(BackendError::Unavailable(format!(
                    "cannot open {}: {e}",
                    base.display()
                )))
            }
        }

        debug!(base = %base.display(), "Opened local folder session");
        Ok(Box::new(LocalFolderSession { base }))
    }
}

/// Session over the base directory; holds no open handles
#[derive(Debug)]
pub struct LocalFolderSession {
    base: PathBuf,
}

impl LocalFolderSession {
    fn resolve(&self, remote: &str) -> Result<PathBuf, BackendError> {
        let relative = Path::new(remote.trim_start_matches('/'));
        let mut resolved = self.base.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => {
                    return Err(BackendError::PermissionDenied(format!(
                        "{remote} escapes the transport root"
                    )))
                }
            }
        }
        trace!(remote = %remote, local = %resolved.display(), "Resolved remote path");
        Ok(resolved)
    }
}

/// Maps an I/O failure on `path` to a backend category.
fn map_io(err: io::Error, path: &str) -> BackendError {
    match err.kind() {
        io::ErrorKind::NotFound => BackendError::NotFound(path.to_string()),
        io::ErrorKind::PermissionDenied => {
            BackendError::PermissionDenied(format!("{path}: {err}"))
        }
        _ => BackendError::Other(format!("{path}: {err}")),
    }
}

#[async_trait::async_trait]
impl ITransportSession for LocalFolderSession {
    async fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let target = self.resolve(path)?;
        match tokio::fs::metadata(&target).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(map_io(e, path)),
        }
    }

    async fn upload(&self, local: &Path, remote: &str, overwrite: bool) -> Result<(), BackendError> {
        let target = self.resolve(remote)?;
        if !overwrite && tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(BackendError::Other(format!("{remote} already exists")));
        }
        tokio::fs::copy(local, &target)
            .await
            .map_err(|e| map_io(e, remote))?;
        Ok(())
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<(), BackendError> {
        let source = self.resolve(remote)?;
        if tokio::fs::metadata(&source)
            .await
            .map_err(|e| map_io(e, remote))?
            .is_dir()
        {
            return Err(BackendError::Other(format!("{remote} is a directory")));
        }
        tokio::fs::copy(&source, local)
            .await
            .map_err(|e| map_io(e, remote))?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let target = self.resolve(path)?;
        tokio::fs::remove_file(&target)
            .await
            .map_err(|e| map_io(e, path))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(BackendError::Other(format!("{to} already exists")));
        }
        tokio::fs::rename(&source, &target)
            .await
            .map_err(|e| map_io(e, to))
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, BackendError> {
        let dir = self.resolve(path)?;
        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| map_io(e, path))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await.map_err(|e| map_io(e, path))? {
            let is_directory = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
            });
        }
        Ok(entries)
    }
}
