//! filerelay Transport - backend adapters for the transport port
//!
//! Provides implementations of [`ITransportBackend`] for:
//! - SFTP servers (`ssh2`, blocking calls moved off the async runtime)
//! - Directory trees on a locally mounted share (`tokio::fs`)
//! - An in-process store used for dry runs and tests
//!
//! ## Modules
//!
//! - [`sftp`] - SFTP backend with password/key authentication and host key pinning
//! - [`local_folder`] - Local directory backend
//! - [`memory`] - In-memory backend with fault injection
//!
//! [`backend_from_config`] picks the adapter named in the transport section.

pub mod local_folder;
pub mod memory;
pub mod sftp;

use std::sync::Arc;

use filerelay_core::config::{TransportConfig, TransportKind};
use filerelay_core::ports::ITransportBackend;
use tracing::debug;

pub use local_folder::LocalFolderBackend;
pub use memory::MemoryBackend;
pub use sftp::SftpBackend;

/// Builds the backend described by `config`.
///
/// Never fails: settings are checked when connecting, so a misconfigured
/// backend reports the same configuration error on every call.
pub fn backend_from_config(config: &TransportConfig) -> Arc<dyn ITransportBackend + Send + Sync> {
    debug!(kind = %config.kind, server = %config.server_address, "Building transport backend");
    match config.kind {
        TransportKind::Sftp => Arc::new(SftpBackend::new(config.clone())),
        TransportKind::Local => Arc::new(LocalFolderBackend::from_config(config)),
        TransportKind::Memory => Arc::new(MemoryBackend::new(config.server_address.clone())),
    }
}
