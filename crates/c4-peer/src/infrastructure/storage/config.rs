//! TOML-based configuration for a game peer.
//!
//! Reads `AppConfig` from an explicit path or the platform-appropriate file:
//! - Windows:  `%APPDATA%\C4Lan\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/c4lan/config.toml` or `~/.config/c4lan/config.toml`
//! - macOS:    `~/Library/Application Support/C4Lan/config.toml`
//!
//! Example:
//!
//! ```toml
//! [peer]
//! log_level = "debug"
//!
//! [network]
//! broadcast_address = "192.168.1.255"
//! discovery_port = 8000
//! announce_interval_ms = 5000
//!
//! [game]
//! columns = 7
//! column_base = 1
//! ```
//!
//! # Serde default values
//!
//! Every section and field is optional.  Fields annotated with
//! `#[serde(default = "some_fn")]` use the return value of `some_fn()` when
//! absent, so a peer runs with no config file at all.

use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use c4_core::{BoardDimensions, ColumnBase, DEFAULT_DISCOVERY_TAG};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::network::discovery::DiscoveryConfig;
use crate::infrastructure::network::interfaces;

/// Error type for configuration loading and validation.
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

    /// An address field is not a valid IP address.
    #[error("invalid {field} {value:?}: expected an IP address")]
    InvalidAddress { field: &'static str, value: String },

    /// A value parsed but is out of its allowed range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level peer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub peer: PeerConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub game: GameConfig,
}

/// General peer behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerConfig {
    /// `tracing` filter directive: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Discovery and rendezvous settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    /// IP address to bind all sockets to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Destination of announcements.  Detected from the network interfaces
    /// when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_address: Option<String>,
    /// UDP port announcements are sent to and listened for on.
    #[serde(default = "default_discovery_port")]
    pub discovery_port: u16,
    /// Tag that prefixes announcements; peers with different tags ignore each other.
    #[serde(default = "default_discovery_tag")]
    pub discovery_tag: String,
    /// Milliseconds between announcements.
    #[serde(default = "default_announce_interval_ms")]
    pub announce_interval_ms: u64,
    /// Lowest rendezvous TCP port (inclusive).
    #[serde(default = "default_rendezvous_port_min")]
    pub rendezvous_port_min: u16,
    /// Highest rendezvous TCP port (inclusive).
    #[serde(default = "default_rendezvous_port_max")]
    pub rendezvous_port_max: u16,
}

/// Board shape and column numbering.  Both peers must agree on all of these.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    #[serde(flatten)]
    pub board: BoardDimensions,
    /// `0` or `1`: the number of the leftmost column on the wire and on screen.
    #[serde(default)]
    pub column_base: ColumnBase,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_discovery_port() -> u16 {
    8000
}
fn default_discovery_tag() -> String {
    DEFAULT_DISCOVERY_TAG.to_string()
}
fn default_announce_interval_ms() -> u64 {
    5000
}
fn default_rendezvous_port_min() -> u16 {
    9000
}
fn default_rendezvous_port_max() -> u16 {
    9099
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            broadcast_address: None,
            discovery_port: default_discovery_port(),
            discovery_tag: default_discovery_tag(),
            announce_interval_ms: default_announce_interval_ms(),
            rendezvous_port_min: default_rendezvous_port_min(),
            rendezvous_port_max: default_rendezvous_port_max(),
        }
    }
}

// ── Validation and derived values ─────────────────────────────────────────────

impl AppConfig {
    /// Checks every field for values the peer cannot run with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError::InvalidAddress`] or
    /// [`ConfigError::Invalid`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let net = &self.network;
        net.bind_ip()?;
        if let Some(address) = &net.broadcast_address {
            parse_ip("broadcast_address", address)?;
        }

        if net.discovery_port == 0 {
            return Err(ConfigError::Invalid("discovery_port must not be 0".into()));
        }
        if net.rendezvous_port_min == 0 {
            return Err(ConfigError::Invalid(
                "rendezvous_port_min must not be 0".into(),
            ));
        }
        if net.rendezvous_port_min > net.rendezvous_port_max {
            return Err(ConfigError::Invalid(format!(
                "rendezvous port range {}..={} is empty",
                net.rendezvous_port_min, net.rendezvous_port_max
            )));
        }
        if net.discovery_tag.is_empty() || net.discovery_tag.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "discovery_tag {:?} must be non-empty and contain no ':'",
                net.discovery_tag
            )));
        }
        if net.announce_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "announce_interval_ms must be greater than 0".into(),
            ));
        }
        self.game
            .board
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        Ok(())
    }

    /// Resolves the network section into a [`DiscoveryConfig`] for a session
    /// that listens on `rendezvous_port`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidAddress`] if an address does not parse.
    pub fn discovery_config(&self, rendezvous_port: u16) -> Result<DiscoveryConfig, ConfigError> {
        let net = &self.network;
        Ok(DiscoveryConfig {
            bind_ip: net.bind_ip()?,
            discovery_port: net.discovery_port,
            broadcast_target: SocketAddr::new(net.broadcast_ip()?, net.discovery_port),
            tag: net.discovery_tag.clone(),
            announce_interval: Duration::from_millis(net.announce_interval_ms),
            rendezvous_port,
        })
    }
}

impl NetworkConfig {
    pub fn bind_ip(&self) -> Result<IpAddr, ConfigError> {
        parse_ip("bind_address", &self.bind_address)
    }

    /// The configured broadcast address, or the detected one when unset.
    pub fn broadcast_ip(&self) -> Result<IpAddr, ConfigError> {
        match &self.broadcast_address {
            Some(address) => parse_ip("broadcast_address", address),
            None => Ok(interfaces::detect_broadcast_address().into()),
        }
    }

    pub fn rendezvous_ports(&self) -> RangeInclusive<u16> {
        self.rendezvous_port_min..=self.rendezvous_port_max
    }
}

fn parse_ip(field: &'static str, value: &str) -> Result<IpAddr, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

// ── Config loading ────────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Parses configuration text.  Validation is left to the caller so that
/// command-line overrides can be applied first.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Loads `AppConfig` from `path`, or from the platform default location when
/// `path` is `None`.
///
/// A missing default file (or an undeterminable platform directory) yields
/// `AppConfig::default()`.  A missing explicit file is an error.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors and
/// [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match config_file_path() {
            Ok(p) => (p, false),
            Err(e) => {
                debug!("{e}; using default configuration");
                return Ok(AppConfig::default());
            }
        },
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            debug!(path = %path.display(), "loaded configuration file");
            parse_config(&content)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => {
            debug!(path = %path.display(), "no configuration file; using defaults");
            Ok(AppConfig::default())
        }
        Err(source) => Err(ConfigError::Io { path, source }),
    }
}

/// Resolves the platform config directory including the `c4lan` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("C4Lan"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("c4lan"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("C4Lan")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_network_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.network.discovery_port, 8000);
        assert_eq!(cfg.network.broadcast_address, None);
        assert_eq!(cfg.network.discovery_tag, "NEW GAME");
        assert_eq!(cfg.network.announce_interval_ms, 5000);
        assert_eq!(cfg.network.rendezvous_ports(), 9000..=9099);
    }

    #[test]
    fn test_app_config_default_game_is_standard() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.game.board, BoardDimensions::default());
        assert_eq!(cfg.game.column_base, ColumnBase::Zero);
        assert_eq!(cfg.peer.log_level, "info");
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    // ── Parsing ───────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg = parse_config("").expect("empty config must parse");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        // Arrange
        let toml_str = r#"
[network]
discovery_port = 8123

[game]
columns = 9
column_base = 1
"#;

        // Act
        let cfg = parse_config(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.network.discovery_port, 8123);
        assert_eq!(cfg.network.rendezvous_port_min, 9000);
        assert_eq!(cfg.game.board.columns, 9);
        assert_eq!(cfg.game.board.rows, 6);
        assert_eq!(cfg.game.column_base, ColumnBase::One);
    }

    #[test]
    fn test_column_base_two_is_a_parse_error() {
        let result = parse_config("[game]\ncolumn_base = 2\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        assert!(matches!(
            parse_config("[[[ not valid toml"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_serializes_and_deserializes_round_trip() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.network.discovery_tag = "LAN PARTY".to_string();
        cfg.game.column_base = ColumnBase::One;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored = parse_config(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    // ── Validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_inverted_port_range() {
        let mut cfg = AppConfig::default();
        cfg.network.rendezvous_port_min = 9100;
        cfg.network.rendezvous_port_max = 9000;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_tag_with_separator() {
        let mut cfg = AppConfig::default();
        cfg.network.discovery_tag = "NEW:GAME".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval_and_ports() {
        let mut cfg = AppConfig::default();
        cfg.network.announce_interval_ms = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = AppConfig::default();
        cfg.network.discovery_port = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unwinnable_board() {
        let mut cfg = AppConfig::default();
        cfg.game.board.win_length = 8;
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_bad_address() {
        let mut cfg = AppConfig::default();
        cfg.network.broadcast_address = Some("not-an-ip".to_string());
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidAddress {
                field: "broadcast_address",
                ..
            })
        ));
    }

    // ── Derived values ────────────────────────────────────────────────────────

    #[test]
    fn test_discovery_config_targets_broadcast_on_discovery_port() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.network.broadcast_address = Some("255.255.255.255".to_string());

        // Act
        let discovery = cfg.discovery_config(9042).unwrap();

        // Assert
        assert_eq!(
            discovery.broadcast_target,
            "255.255.255.255:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(discovery.rendezvous_addr().port(), 9042);
        assert_eq!(discovery.announce_interval, Duration::from_millis(5000));
        assert_eq!(discovery.tag, "NEW GAME");
    }

    #[test]
    fn test_discovery_config_without_broadcast_address_uses_detection() {
        // Arrange
        let cfg = AppConfig::default();

        // Act
        let discovery = cfg.discovery_config(9042).unwrap();

        // Assert
        assert!(discovery.broadcast_target.ip().is_ipv4());
        assert!(!discovery.broadcast_target.ip().is_loopback());
        assert_eq!(discovery.broadcast_target.port(), 8000);
    }

    #[test]
    fn test_broadcast_address_in_toml_overrides_detection() {
        let cfg = parse_config("[network]\nbroadcast_address = \"10.1.255.255\"\n").unwrap();
        assert_eq!(
            cfg.network.broadcast_ip().unwrap(),
            "10.1.255.255".parse::<IpAddr>().unwrap()
        );
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_from_explicit_path() {
        // Arrange
        let dir = std::env::temp_dir().join(format!("c4lan_test_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[peer]\nlog_level = \"debug\"\n").unwrap();

        // Act
        let loaded = load_config(Some(&path)).unwrap();

        // Assert
        assert_eq!(loaded.peer.log_level, "debug");

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_missing_explicit_path_is_io_error() {
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("c4lan/config.toml") || path.ends_with("config.toml"),
                "config file must be named config.toml, got {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped CI env is also acceptable.
    }
}
