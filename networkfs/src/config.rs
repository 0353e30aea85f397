//! Configuration file handling.
//!
//! Settings live in an INI file, by default
//! `$XDG_CONFIG_HOME/networkfs/config.ini`:
//!
//! ```ini
//! [remote]
//! url = http://nerc.itmo.ru/teaching/os/networkfs/v1
//! timeout = 30
//!
//! [mount]
//! oversize_writes = truncate
//! attr_ttl = 1
//!
//! [logging]
//! level = info
//! directory =
//! ```
//!
//! A missing file yields the defaults; a present file only needs the keys
//! it wants to change.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::content::OversizePolicy;
use crate::remote::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};

/// Default attribute TTL handed to the kernel, in seconds.
pub const DEFAULT_ATTR_TTL_SECS: u64 = 1;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors reading or writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid value for [{section}] {key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        reason: String,
    },

    #[error("No configuration directory available on this system")]
    NoConfigDir,
}

/// `[remote]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub url: String,
    pub timeout: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[mount]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSettings {
    pub oversize_writes: OversizePolicy,
    pub attr_ttl: u64,
}

impl Default for MountSettings {
    fn default() -> Self {
        Self {
            oversize_writes: OversizePolicy::default(),
            attr_ttl: DEFAULT_ATTR_TTL_SECS,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    /// Directory for daily log files; `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub remote: RemoteSettings,
    pub mount: MountSettings,
    pub logging: LoggingSettings,
}

/// Default location of the configuration file.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("networkfs").join("config.ini"))
        .ok_or(ConfigError::NoConfigDir)
}

fn parse_value<T: FromStr>(
    section: &'static str,
    key: &'static str,
    raw: &str,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            section,
            key,
            reason: e.to_string(),
        })
}

impl ConfigFile {
    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_config_path()?)
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("remote")) {
            if let Some(url) = section.get("url") {
                let url = url.trim();
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidValue {
                        section: "remote",
                        key: "url",
                        reason: format!("'{}' is not an http(s) URL", url),
                    });
                }
                config.remote.url = url.to_string();
            }
            if let Some(timeout) = section.get("timeout") {
                config.remote.timeout = parse_value("remote", "timeout", timeout)?;
            }
        }

        if let Some(section) = ini.section(Some("mount")) {
            if let Some(policy) = section.get("oversize_writes") {
                config.mount.oversize_writes =
                    parse_value("mount", "oversize_writes", policy)?;
            }
            if let Some(ttl) = section.get("attr_ttl") {
                config.mount.attr_ttl = parse_value("mount", "attr_ttl", ttl)?;
            }
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = section.get("level") {
                let level = level.trim();
                if !level.is_empty() {
                    config.logging.level = level.to_string();
                }
            }
            if let Some(dir) = section.get("directory") {
                let dir = dir.trim();
                config.logging.directory = (!dir.is_empty()).then(|| PathBuf::from(dir));
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("remote"))
            .set("url", self.remote.url.as_str())
            .set("timeout", self.remote.timeout.to_string());
        ini.with_section(Some("mount"))
            .set("oversize_writes", self.mount.oversize_writes.as_str())
            .set("attr_ttl", self.mount.attr_ttl.to_string());
        ini.with_section(Some("logging"))
            .set("level", self.logging.level.as_str())
            .set(
                "directory",
                self.logging
                    .directory
                    .as_ref()
                    .map(|d| d.to_string_lossy().to_string())
                    .unwrap_or_default(),
            );
        ini
    }

    /// Write to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }
}
