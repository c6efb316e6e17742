//! TOML-based configuration persistence for the gateway.
//!
//! Reads and writes [`GatewayConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\TuioGateway\config.toml`
//! - Linux:    `~/.config/tuiogateway/config.toml`
//! - macOS:    `~/Library/Application Support/TuioGateway/config.toml`
//!
//! or to an explicit path passed with `--config`.
//!
//! ```toml
//! [gateway]
//! mode = 2              # 0 receiver, 1 sender, 2 router, 3 random sender
//! frame_rate_hz = 60
//! log_level = "info"
//!
//! [network]
//! local_tuio_port = 3333
//! remote_ip = "127.0.0.1"
//! remote_tuio_port = 3334
//! sender_local_port = 0
//!
//! [display]
//! n_displays = 1
//! remote_display_id = 1
//!
//! [osc]
//! enabled = false
//! remote_port = 3335
//! max_cursor_count = 10
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "…")]` and every section
//! `#[serde(default)]`, so a missing file, a missing section, or a missing key
//! all fall back to defaults.
//!
//! # Clamping
//!
//! Values are stored exactly as written.  Range checks happen in one place,
//! [`GatewayConfig::snapshot`], which produces the immutable
//! [`RelaySettings`] the relay actually uses.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tuio_core::{DisplayPartition, Mode, OscMirrorSettings, RelaySettings};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level gateway configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gateway: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub osc: OscConfig,
}

/// Operating mode, cycle rate and logging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Mode index, clamped into `0..=3` on use.
    #[serde(default = "default_mode")]
    pub mode: i64,
    /// Output cycles per second, clamped into `1..=1000` on use.
    #[serde(default = "default_frame_rate_hz")]
    pub frame_rate_hz: u32,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Ports and remote address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_local_tuio_port")]
    pub local_tuio_port: u16,
    /// Hostname or IP address of the downstream receiver.
    #[serde(default = "default_remote_ip")]
    pub remote_ip: String,
    #[serde(default = "default_remote_tuio_port")]
    pub remote_tuio_port: u16,
    /// Local port of the outbound socket; `0` lets the OS choose.
    #[serde(default)]
    pub sender_local_port: u16,
}

/// Display partition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Number of tiles, clamped into `1..=8` on use.
    #[serde(default = "default_one")]
    pub n_displays: i32,
    /// One-based target tile, clamped into `1..=n_displays` on use.
    #[serde(default = "default_one")]
    pub remote_display_id: i32,
}

/// Plain-OSC cursor mirror.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OscConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_osc_port")]
    pub remote_port: u16,
    #[serde(default = "default_max_cursor_count")]
    pub max_cursor_count: usize,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_mode() -> i64 {
    Mode::default().index()
}
fn default_frame_rate_hz() -> u32 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_local_tuio_port() -> u16 {
    3333
}
fn default_remote_ip() -> String {
    "127.0.0.1".to_string()
}
fn default_remote_tuio_port() -> u16 {
    3334
}
fn default_one() -> i32 {
    1
}
fn default_osc_port() -> u16 {
    3335
}
fn default_max_cursor_count() -> usize {
    10
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            frame_rate_hz: default_frame_rate_hz(),
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            local_tuio_port: default_local_tuio_port(),
            remote_ip: default_remote_ip(),
            remote_tuio_port: default_remote_tuio_port(),
            sender_local_port: 0,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            n_displays: default_one(),
            remote_display_id: default_one(),
        }
    }
}

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            remote_port: default_osc_port(),
            max_cursor_count: default_max_cursor_count(),
        }
    }
}

impl GatewayConfig {
    /// The configured mode, clamped.
    pub fn mode(&self) -> Mode {
        Mode::from_index(self.gateway.mode)
    }

    /// Builds the immutable settings snapshot, clamping every range.
    pub fn snapshot(&self) -> RelaySettings {
        RelaySettings {
            mode: self.mode(),
            local_tuio_port: self.network.local_tuio_port,
            remote_host: self.network.remote_ip.trim().to_string(),
            remote_tuio_port: self.network.remote_tuio_port,
            sender_local_port: self.network.sender_local_port,
            partition: DisplayPartition::new(
                self.display.n_displays,
                self.display.remote_display_id,
            ),
            frame_interval: RelaySettings::interval_for_rate(self.gateway.frame_rate_hz),
            osc_mirror: self.osc.enabled.then(|| OscMirrorSettings {
                remote_port: self.osc.remote_port,
                max_cursor_count: self.osc.max_cursor_count,
            }),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<GatewayConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(GatewayConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads the config from the platform location.
///
/// # Errors
///
/// See [`load_config_from`]; additionally [`ConfigError::NoPlatformConfigDir`].
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Persists `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &GatewayConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the `TuioGateway` part.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("TuioGateway"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("tuiogateway"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("TuioGateway")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
