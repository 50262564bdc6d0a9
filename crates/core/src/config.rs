// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race rules configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Shortest race that may be created, in meters
pub const DEFAULT_MIN_DISTANCE: u32 = 100;

/// Delay between all-ready detection and race start
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Rules every race is created under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    /// Minimum target distance in meters
    pub min_distance: u32,
    /// Countdown length once every participant is ready
    #[serde(with = "humantime_serde")]
    pub countdown: Duration,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            min_distance: DEFAULT_MIN_DISTANCE,
            countdown: DEFAULT_COUNTDOWN,
        }
    }
}

impl RaceConfig {
    pub fn with_countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_distance == 0 {
            return Err(ConfigError::Invalid(
                "race.min_distance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
