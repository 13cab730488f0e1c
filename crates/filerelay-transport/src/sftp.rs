//! SFTP backend
//!
//! Talks to an SFTP server through `ssh2`. libssh2 calls block, so each
//! session operation runs on tokio's blocking pool while holding the
//! session's lock. One SSH connection is opened per boundary call and
//! closed when the session is dropped.

use std::fs::File;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use filerelay_core::config::TransportConfig;
use filerelay_core::ports::{BackendError, ITransportBackend, ITransportSession, RemoteEntry};
use ssh2::{ErrorCode, HashType, OpenFlags, OpenType, RenameFlags, Session, Sftp};
use tracing::{debug, info, warn};

/// libssh2 status codes returned inside SFTP errors
const FX_NO_SUCH_FILE: i32 = 2;
const FX_PERMISSION_DENIED: i32 = 3;
const FX_NO_SUCH_PATH: i32 = 10;

/// Backend for one SFTP server
#[derive(Debug, Clone)]
pub struct SftpBackend {
    config: TransportConfig,
}

impl SftpBackend {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    fn check_config(&self) -> Result<(), BackendError> {
        let errors = self.config.validate();
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(BackendError::Configuration(joined))
    }
}

#[async_trait::async_trait]
impl ITransportBackend for SftpBackend {
    fn server_address(&self) -> &str {
        &self.config.server_address
    }

    async fn connect(&self) -> Result<Box<dyn ITransportSession>, BackendError> {
        self.check_config()?;

        let config = self.config.clone();
        let connection = tokio::task::spawn_blocking(move || open_connection(&config))
            .await
            .map_err(|e| BackendError::Unavailable(format!("sftp connect task failed: {e}")))??;

        Ok(Box::new(SftpSession {
            conn: Arc::new(Mutex::new(connection)),
        }))
    }
}

// ============================================================================
// Connection setup
// ============================================================================

struct Connection {
    session: Session,
    sftp: Sftp,
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.session.disconnect(None, "filerelay session closed", None) {
            debug!(error = %e, "SFTP disconnect failed");
        }
    }
}

fn open_connection(config: &TransportConfig) -> Result<Connection, BackendError> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    let tcp = connect_tcp(&config.server_address, config.port, timeout)?;

    let mut session = Session::new()
        .map_err(|e| BackendError::Unavailable(format!("cannot create SSH session: {e}")))?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX));
    session
        .handshake()
        .map_err(|e| BackendError::Unavailable(format!("SSH handshake failed: {e}")))?;

    verify_host_key(&session, config)?;
    authenticate(&session, config)?;

    let sftp = session
        .sftp()
        .map_err(|e| BackendError::Unavailable(format!("cannot start SFTP subsystem: {e}")))?;

    info!(
        server = %config.server_address,
        port = config.port,
        username = %config.username,
        "SFTP session opened"
    );
    Ok(Connection { session, sftp })
}

fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, BackendError> {
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| BackendError::Unavailable(format!("cannot resolve {host}:{port}: {e}")))?;

    let mut last_error = None;
    for addr in addrs {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(BackendError::Unavailable(match last_error {
        Some(e) => format!("TCP connection to {host}:{port} failed: {e}"),
        None => format!("{host}:{port} resolved to no addresses"),
    }))
}

/// Formats a raw SHA256 host key hash the way `ssh-keygen -l` prints it.
pub fn format_fingerprint(hash: &[u8]) -> String {
    format!("SHA256:{}", STANDARD_NO_PAD.encode(hash))
}

fn fingerprints_match(expected: &str, actual: &str) -> bool {
    let normalize = |s: &str| s.trim().trim_end_matches('=').to_string();
    normalize(expected) == normalize(actual)
}

fn verify_host_key(session: &Session, config: &TransportConfig) -> Result<(), BackendError> {
    if config.accept_any_host_key {
        warn!(server = %config.server_address, "Host key verification disabled");
        return Ok(());
    }
    let expected = config.host_key_fingerprint.as_deref().unwrap_or_default();
    let actual = session
        .host_key_hash(HashType::Sha256)
        .map(format_fingerprint)
        .ok_or_else(|| BackendError::Unavailable("server sent no host key".to_string()))?;

    if !fingerprints_match(expected, &actual) {
        return Err(BackendError::PermissionDenied(format!(
            "host key mismatch for {}: expected {expected}, got {actual}",
            config.server_address
        )));
    }
    Ok(())
}

fn authenticate(session: &Session, config: &TransportConfig) -> Result<(), BackendError> {
    if let Some(key) = &config.private_key_path {
        let passphrase = config.private_key_passphrase.as_deref();
        match session.userauth_pubkey_file(&config.username, None, key, passphrase) {
            Ok(()) if session.authenticated() => {
                debug!(key = %key.display(), "Authenticated with private key");
                return Ok(());
            }
            Ok(()) => {}
            Err(e) => debug!(error = %e, "Private key authentication failed"),
        }
    }

    if let Some(password) = &config.password {
        match session.userauth_password(&config.username, password) {
            Ok(()) if session.authenticated() => {
                debug!("Authenticated with password");
                return Ok(());
            }
            Ok(()) => {}
            Err(e) => debug!(error = %e, "Password authentication failed"),
        }
    }

    Err(BackendError::PermissionDenied(format!(
        "authentication failed for user '{}'",
        config.username
    )))
}

// ============================================================================
// Session
// ============================================================================

/// One open SFTP connection
pub struct SftpSession {
    conn: Arc<Mutex<Connection>>,
}

impl SftpSession {
    /// Runs a blocking SFTP operation on the blocking pool.
    async fn run<T, F>(&self, op: F) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(&Sftp) -> Result<T, BackendError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| BackendError::Unavailable("sftp session lock poisoned".to_string()))?;
            op(&guard.sftp)
        })
        .await
        .map_err(|e| BackendError::Unavailable(format!("sftp worker failed: {e}")))?
    }
}

/// Maps an ssh2 failure on `path` to a backend category.
fn map_ssh_error(err: &ssh2::Error, path: &str) -> BackendError {
    let detail = format!("{path}: {}", err.message());
    match err.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) | ErrorCode::SFTP(FX_NO_SUCH_PATH) => {
            BackendError::NotFound(detail)
        }
        ErrorCode::SFTP(FX_PERMISSION_DENIED) => BackendError::PermissionDenied(detail),
        _ if err.message().to_ascii_lowercase().contains("denied") => {
            BackendError::PermissionDenied(detail)
        }
        ErrorCode::Session(_) => BackendError::Unavailable(detail),
        ErrorCode::SFTP(_) => BackendError::Other(detail),
    }
}

fn local_io(err: io::Error, path: &Path) -> BackendError {
    BackendError::Unavailable(format!("local file {}: {err}", path.display()))
}

#[async_trait::async_trait]
impl ITransportSession for SftpSession {
    async fn exists(&self, path: &str) -> Result<bool, BackendError> {
        let path = path.to_string();
        self.run(move |sftp| match sftp.stat(Path::new(&path)) {
            Ok(stat) => Ok(!stat.is_dir()),
            Err(e) => match map_ssh_error(&e, &path) {
                BackendError::NotFound(_) => Ok(false),
                other => Err(other),
            },
        })
        .await
    }

    async fn upload(&self, local: &Path, remote: &str, overwrite: bool) -> Result<(), BackendError> {
        let local = local.to_path_buf();
        let remote = remote.to_string();
        self.run(move |sftp| {
            let mut flags = OpenFlags::WRITE | OpenFlags::CREATE;
            flags |= if overwrite {
                OpenFlags::TRUNCATE
            } else {
                OpenFlags::EXCLUSIVE
            };
            let mut source = File::open(&local).map_err(|e| local_io(e, &local))?;
            let mut target = sftp
                .open_mode(Path::new(&remote), flags, 0o644, OpenType::File)
                .map_err(|e| map_ssh_error(&e, &remote))?;
            let written = io::copy(&mut source, &mut target)
                .map_err(|e| BackendError::Other(format!("{remote}: write failed: {e}")))?;
            debug!(remote_path = %remote, size_bytes = written, "Uploaded over SFTP");
            Ok(())
        })
        .await
    }

    async fn download(&self, remote: &str, local: &Path) -> Result<(), BackendError> {
        let local: PathBuf = local.to_path_buf();
        let remote = remote.to_string();
        self.run(move |sftp| {
            let mut source = sftp
                .open(Path::new(&remote))
                .map_err(|e| map_ssh_error(&e, &remote))?;
            let mut target = File::create(&local).map_err(|e| local_io(e, &local))?;
            let read = io::copy(&mut source, &mut target)
                .map_err(|e| BackendError::Other(format!("{remote}: read failed: {e}")))?;
            debug!(remote_path = %remote, size_bytes = read, "Downloaded over SFTP");
            Ok(())
        })
        .await
    }

    async fn delete(&self, path: &str) -> Result<(), BackendError> {
        let path = path.to_string();
        self.run(move |sftp| {
            sftp.unlink(Path::new(&path))
                .map_err(|e| map_ssh_error(&e, &path))
        })
        .await
    }

    async fn rename(&self, from: &str, to: &str) -> Result<(), BackendError> {
        let from = from.to_string();
        let to = to.to_string();
        self.run(move |sftp| {
            sftp.rename(
                Path::new(&from),
                Path::new(&to),
                Some(RenameFlags::ATOMIC | RenameFlags::NATIVE),
            )
            .map_err(|e| map_ssh_error(&e, &to))
        })
        .await
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<RemoteEntry>, BackendError> {
        let path = path.to_string();
        self.run(move |sftp| {
            let entries = sftp
                .readdir(Path::new(&path))
                .map_err(|e| map_ssh_error(&e, &path))?;
            Ok(entries
                .into_iter()
                .filter_map(|(entry_path, stat)| {
                    let name = entry_path.file_name()?.to_string_lossy().into_owned();
                    Some(RemoteEntry {
                        name,
                        is_directory: stat.is_dir(),
                    })
                })
                .collect())
        })
        .await
    }
}
