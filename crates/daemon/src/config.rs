// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: TOML file plus derived state paths.
//!
//! ```toml
//! [race]
//! min_distance = 100
//! countdown = "10s"
//!
//! [daemon]
//! state_dir = "/var/lib/erg"
//! tick_interval = "1s"
//! request_timeout = "5s"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use erg_core::{ConfigError, RaceConfig};
use serde::Deserialize;

use crate::protocol::DEFAULT_TIMEOUT;

/// Env var naming the config file when `--config` is absent
pub const CONFIG_ENV: &str = "ERG_CONFIG";

/// Env var overriding the default state directory
pub const STATE_DIR_ENV: &str = "ERG_STATE_DIR";

pub const SOCKET_FILE: &str = "ergd.sock";
pub const LOCK_FILE: &str = "ergd.pid";
pub const LOG_FILE: &str = "ergd.log";

/// How often the daemon checks for expired countdowns
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    race: RaceConfig,
    daemon: DaemonSection,
}

/// `[daemon]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonSection {
    pub state_dir: Option<PathBuf>,
    #[serde(with = "humantime_serde")]
    pub tick_interval: Duration,
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            state_dir: None,
            tick_interval: DEFAULT_TICK_INTERVAL,
            request_timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Resolved daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub race: RaceConfig,
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    pub log_path: PathBuf,
    pub wal_path: PathBuf,
    pub tick_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Defaults rooted at `state_dir`
    pub fn for_state_dir(state_dir: impl Into<PathBuf>) -> Self {
        Self::resolve(RaceConfig::default(), DaemonSection::default(), state_dir.into())
    }

    /// Load from `path`, or from `ERG_CONFIG`, or fall back to defaults
    ///
    /// A config path that does not exist yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let Some(path) = path else {
            return Self::from_file(ConfigFile::default());
        };

        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_toml(&text, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Self::from_file(ConfigFile::default())
            }
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self, ConfigError> {
        file.race.validate()?;
        if file.daemon.tick_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "daemon.tick_interval must be positive".to_string(),
            ));
        }
        if file.daemon.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "daemon.request_timeout must be positive".to_string(),
            ));
        }

        let state_dir = match file.daemon.state_dir.clone() {
            Some(dir) => dir,
            None => default_state_dir()?,
        };
        Ok(Self::resolve(file.race, file.daemon, state_dir))
    }

    fn resolve(race: RaceConfig, daemon: DaemonSection, state_dir: PathBuf) -> Self {
        Self {
            race,
            socket_path: state_dir.join(SOCKET_FILE),
            lock_path: state_dir.join(LOCK_FILE),
            log_path: state_dir.join(LOG_FILE),
            wal_path: state_dir.join("wal").join("races.wal"),
            state_dir,
            tick_interval: daemon.tick_interval,
            request_timeout: daemon.request_timeout,
        }
    }
}

/// `ERG_STATE_DIR`, else the platform state dir, else `~/.local/state/erg`
pub fn default_state_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(STATE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = dirs::state_dir() {
        return Ok(dir.join("erg"));
    }
    dirs::home_dir()
        .map(|home| home.join(".local").join("state").join("erg"))
        .ok_or_else(|| {
            ConfigError::Invalid(format!(
                "could not determine state directory; set {}",
                STATE_DIR_ENV
            ))
        })
}

/// Socket path of a daemon running with the default state directory
pub fn default_socket_path() -> Result<PathBuf, ConfigError> {
    Ok(default_state_dir()?.join(SOCKET_FILE))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
