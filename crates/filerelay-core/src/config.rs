//! Configuration module for filerelay.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{remote_path, FileType, PollRequest, ResumptionToken};
use crate::scratch::ScratchArea;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for filerelay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub scratch: ScratchConfig,
    pub triggers: Vec<TriggerConfig>,
    pub daemon: DaemonConfig,
    pub logging: LoggingConfig,
}

/// Which backend adapter to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Directory tree on a mounted share.
    #[default]
    Local,
    /// Remote SFTP server.
    Sftp,
    /// In-process store (dry runs and tests).
    Memory,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TransportKind::Local => "local",
            TransportKind::Sftp => "sftp",
            TransportKind::Memory => "memory",
        };
        write!(f, "{s}")
    }
}

/// Remote store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// Host name or IP of the SFTP server; also reported in file descriptors.
    pub server_address: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    /// OpenSSH private key used for public key authentication.
    pub private_key_path: Option<PathBuf>,
    pub private_key_passphrase: Option<String>,
    /// Skip host key verification entirely.
    pub accept_any_host_key: bool,
    /// Expected host key, `SHA256:<base64>` as printed by `ssh-keygen -l`.
    pub host_key_fingerprint: Option<String>,
    /// Prefix joined to every caller-supplied path.
    pub root_folder: String,
    /// Base directory for the `local` kind.
    pub local_root: Option<PathBuf>,
    pub connect_timeout_secs: u64,
}

/// Local scratch directory settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScratchConfig {
    /// Base for per-call scratch directories; system temp dir when unset.
    pub directory: Option<PathBuf>,
}

/// One folder watched by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    pub name: String,
    pub folder: String,
    #[serde(default = "default_include_mask")]
    pub include_mask: String,
    #[serde(default)]
    pub exclude_mask: Option<String>,
    #[serde(default)]
    pub file_type: FileType,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Local directory delivered files are written to.
    pub inbox: PathBuf,
}

/// Daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// JSON file holding the resumption token of every trigger.
    pub state_file: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Output format: `pretty` or `json`.
    pub format: String,
}

fn default_include_mask() -> String {
    "*".to_string()
}

fn default_interval_secs() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/filerelay/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("filerelay")
            .join("config.yaml")
    }

    /// Scratch area described by the `scratch` section.
    pub fn scratch_area(&self) -> ScratchArea {
        match &self.scratch.directory {
            Some(dir) => ScratchArea::in_dir(dir),
            None => ScratchArea::system(),
        }
    }

    /// Looks up a trigger by name.
    pub fn trigger(&self, name: &str) -> Option<&TriggerConfig> {
        self.triggers.iter().find(|t| t.name == name)
    }
}

impl TriggerConfig {
    /// Poll request for this trigger resuming from `token`.
    pub fn poll_request(&self, token: ResumptionToken) -> PollRequest {
        PollRequest::new(&self.folder, token)
            .with_masks(&self.include_mask, self.exclude_mask.clone())
            .with_file_type(self.file_type)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Local,
            server_address: "localhost".to_string(),
            port: 22,
            username: String::new(),
            password: None,
            private_key_path: None,
            private_key_passphrase: None,
            accept_any_host_key: false,
            host_key_fingerprint: None,
            root_folder: String::new(),
            local_root: Some(
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                    .join("filerelay")
                    .join("store"),
            ),
            connect_timeout_secs: 30,
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            state_file: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("filerelay")
                .join("triggers.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transport.username"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid values for `logging.format`.
const VALID_LOG_FORMATS: &[&str] = &["pretty", "json"];

impl TransportConfig {
    /// Validate only the transport section.
    ///
    /// Adapters call this when connecting so a misconfigured backend fails
    /// the same way on every call.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        match self.kind {
            TransportKind::Sftp => {
                if remote_path::is_blank(&self.server_address) {
                    errors.push(ValidationError::new(
                        "transport.server_address",
                        "is required for sftp",
                    ));
                }
                if remote_path::is_blank(&self.username) {
                    errors.push(ValidationError::new(
                        "transport.username",
                        "is required for sftp",
                    ));
                }
                if self.port == 0 {
                    errors.push(ValidationError::new(
                        "transport.port",
                        "must be greater than 0",
                    ));
                }
                if self.private_key_passphrase.is_some() && self.private_key_path.is_none() {
                    errors.push(ValidationError::new(
                        "transport.private_key_passphrase",
                        "is set but transport.private_key_path is missing",
                    ));
                }
                let no_fingerprint = self
                    .host_key_fingerprint
                    .as_deref()
                    .map_or(true, remote_path::is_blank);
                if !self.accept_any_host_key && no_fingerprint {
                    errors.push(ValidationError::new(
                        "transport.host_key_fingerprint",
                        "is required unless transport.accept_any_host_key is true",
                    ));
                }
            }
            TransportKind::Local => {
                if self.local_root.is_none() {
                    errors.push(ValidationError::new(
                        "transport.local_root",
                        "is required for the local transport",
                    ));
                }
            }
            TransportKind::Memory => {}
        }

        if self.connect_timeout_secs == 0 {
            errors.push(ValidationError::new(
                "transport.connect_timeout_secs",
                "must be greater than 0",
            ));
        }

        errors
    }
}

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.transport.validate();

        // --- triggers ---
        let mut names = HashSet::new();
        for (i, trigger) in self.triggers.iter().enumerate() {
            let prefix = format!("triggers[{i}]");
            if remote_path::is_blank(&trigger.name) {
                errors.push(ValidationError::new(
                    format!("{prefix}.name"),
                    "must not be empty",
                ));
            } else if !names.insert(trigger.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("{prefix}.name"),
                    format!("duplicate trigger name '{}'", trigger.name),
                ));
            }
            if remote_path::is_blank(&trigger.folder) {
                errors.push(ValidationError::new(
                    format!("{prefix}.folder"),
                    "must not be empty",
                ));
            }
            if trigger.interval_secs == 0 {
                errors.push(ValidationError::new(
                    format!("{prefix}.interval_secs"),
                    "must be greater than 0",
                ));
            }
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError::new(
                "logging.level",
                format!(
                    "invalid level '{}'; expected one of: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            ));
        }
        if !VALID_LOG_FORMATS.contains(&self.logging.format.as_str()) {
            errors.push(ValidationError::new(
                "logging.format",
                format!(
                    "invalid format '{}'; expected one of: {}",
                    self.logging.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            ));
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and lets callers override individual
/// fields before calling [`build`](ConfigBuilder::build).
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pre-populated with defaults.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- transport ---

    pub fn transport_kind(mut self, kind: TransportKind) -> Self {
        self.config.transport.kind = kind;
        self
    }

    pub fn server_address(mut self, address: impl Into<String>) -> Self {
        self.config.transport.server_address = address.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.transport.port = port;
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.transport.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.transport.password = Some(password.into());
        self
    }

    pub fn private_key(mut self, path: PathBuf, passphrase: Option<String>) -> Self {
        self.config.transport.private_key_path = Some(path);
        self.config.transport.private_key_passphrase = passphrase;
        self
    }

    pub fn accept_any_host_key(mut self, accept: bool) -> Self {
        self.config.transport.accept_any_host_key = accept;
        self
    }

    pub fn host_key_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.config.transport.host_key_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn root_folder(mut self, root: impl Into<String>) -> Self {
        self.config.transport.root_folder = root.into();
        self
    }

    pub fn local_root(mut self, root: PathBuf) -> Self {
        self.config.transport.local_root = Some(root);
        self
    }

    // --- scratch ---

    pub fn scratch_directory(mut self, dir: PathBuf) -> Self {
        self.config.scratch.directory = Some(dir);
        self
    }

    // --- triggers ---

    pub fn trigger(mut self, trigger: TriggerConfig) -> Self {
        self.config.triggers.push(trigger);
        self
    }

    // --- daemon ---

    pub fn state_file(mut self, path: PathBuf) -> Self {
        self.config.daemon.state_file = path;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_format(mut self, format: impl Into<String>) -> Self {
        self.config.logging.format = format.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn trigger(name: &str) -> TriggerConfig {
        TriggerConfig {
            name: name.to_string(),
            folder: "inbound".to_string(),
            include_mask: "*.xml".to_string(),
            exclude_mask: None,
            file_type: FileType::Text,
            interval_secs: 10,
            inbox: PathBuf::from("/tmp/inbox"),
        }
    }

    fn sftp_builder() -> ConfigBuilder {
        ConfigBuilder::new()
            .transport_kind(TransportKind::Sftp)
            .server_address("sftp.example.com")
            .username("relay")
            .password("secret")
            .accept_any_host_key(true)
    }

    // -- Defaults --

    #[test]
    fn default_config_has_sensible_values() {
        let cfg = Config::default();
        assert_eq!(cfg.transport.kind, TransportKind::Local);
        assert_eq!(cfg.transport.port, 22);
        assert_eq!(cfg.transport.connect_timeout_secs, 30);
        assert!(cfg.transport.root_folder.is_empty());
        assert!(cfg.triggers.is_empty());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.format, "pretty");
        assert!(cfg
            .daemon
            .state_file
            .to_string_lossy()
            .ends_with("triggers.json"));
    }

    #[test]
    fn default_config_passes_validation() {
        let errors = Config::default().validate();
        assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
    }

    // -- Loading --

    #[test]
    fn load_from_yaml_file() {
        let yaml = r#"
transport:
  kind: sftp
  server_address: sftp.example.com
  port: 2222
  username: relay
  private_key_path: /home/relay/.ssh/id_ed25519
  host_key_fingerprint: "SHA256:abc"
  root_folder: data
scratch:
  directory: /var/tmp/filerelay
triggers:
  - name: orders
    folder: inbound/orders
    include_mask: "*.xml"
    exclude_mask: "draft_*"
    file_type: binary
    interval_secs: 15
    inbox: /srv/inbox/orders
  - name: invoices
    folder: inbound/invoices
    inbox: /srv/inbox/invoices
daemon:
  state_file: /var/lib/filerelay/state.json
logging:
  level: debug
  format: json
"#;
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        tmp.write_all(yaml.as_bytes()).unwrap();
        tmp.flush().unwrap();

        let cfg = Config::load(tmp.path()).expect("load config");
        assert_eq!(cfg.transport.kind, TransportKind::Sftp);
        assert_eq!(cfg.transport.port, 2222);
        assert_eq!(
            cfg.transport.private_key_path,
            Some(PathBuf::from("/home/relay/.ssh/id_ed25519"))
        );
        assert_eq!(cfg.transport.root_folder, "data");
        assert_eq!(
            cfg.scratch.directory,
            Some(PathBuf::from("/var/tmp/filerelay"))
        );
        assert_eq!(cfg.triggers.len(), 2);
        assert_eq!(cfg.triggers[0].file_type, FileType::Binary);
        assert_eq!(cfg.triggers[0].exclude_mask.as_deref(), Some("draft_*"));
        assert_eq!(cfg.triggers[1].include_mask, "*");
        assert_eq!(cfg.triggers[1].interval_secs, 30);
        assert_eq!(cfg.triggers[1].file_type, FileType::Text);
        assert_eq!(
            cfg.daemon.state_file,
            PathBuf::from("/var/lib/filerelay/state.json")
        );
        assert_eq!(cfg.logging.format, "json");
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg: Config = serde_yaml::from_str("logging:\n  level: warn\n").unwrap();
        assert_eq!(cfg.logging.level, "warn");
        assert_eq!(cfg.logging.format, "pretty");
        assert_eq!(cfg.transport.port, 22);
    }

    #[test]
    fn load_or_default_returns_default_on_missing_file() {
        let cfg = Config::load_or_default(Path::new("/nonexistent/config.yaml"));
        assert_eq!(cfg.transport.port, 22);
    }

    #[test]
    fn default_path_ends_with_filerelay_config() {
        let path = Config::default_path();
        assert!(path.ends_with("filerelay/config.yaml"));
    }

    // -- Validation --

    #[test]
    fn sftp_requires_address_and_username() {
        let errors = ConfigBuilder::new()
            .transport_kind(TransportKind::Sftp)
            .server_address(" ")
            .accept_any_host_key(true)
            .build()
            .validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"transport.server_address"));
        assert!(fields.contains(&"transport.username"));
    }

    #[test]
    fn passphrase_without_key_is_invalid() {
        let mut cfg = sftp_builder().build();
        cfg.transport.private_key_passphrase = Some("pw".into());
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "transport.private_key_passphrase");
    }

    #[test]
    fn fingerprint_required_unless_any_host_key() {
        let errors = sftp_builder().accept_any_host_key(false).build().validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "transport.host_key_fingerprint");

        let ok = sftp_builder()
            .accept_any_host_key(false)
            .host_key_fingerprint("SHA256:abc")
            .build_validated();
        assert!(ok.is_ok());
    }

    #[test]
    fn duplicate_trigger_names_rejected() {
        let errors = ConfigBuilder::new()
            .trigger(trigger("orders"))
            .trigger(trigger("orders"))
            .build()
            .validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "triggers[1].name");
    }

    #[test]
    fn zero_interval_and_blank_folder_rejected() {
        let mut t = trigger("orders");
        t.interval_secs = 0;
        t.folder = "  ".into();
        let errors = ConfigBuilder::new().trigger(t).build().validate();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"triggers[0].interval_secs"));
        assert!(fields.contains(&"triggers[0].folder"));
    }

    #[test]
    fn invalid_logging_values_rejected() {
        let result = ConfigBuilder::new()
            .logging_level("verbose")
            .logging_format("xml")
            .build_validated();
        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().starts_with("logging.level:"));
    }

    #[test]
    fn trigger_builds_poll_request() {
        let mut t = trigger("orders");
        t.exclude_mask = Some("*.tmp".into());
        t.file_type = FileType::Binary;
        let request = t.poll_request(ResumptionToken::from("a.xml"));
        assert_eq!(request.folder, "inbound");
        assert_eq!(request.include_mask, "*.xml");
        assert_eq!(request.exclude_mask.as_deref(), Some("*.tmp"));
        assert_eq!(request.file_type, FileType::Binary);
        assert_eq!(request.token.as_str(), "a.xml");
    }
}
