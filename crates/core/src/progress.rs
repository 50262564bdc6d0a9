// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only progress log entries

use crate::race::{Race, RaceId, UserId};
use crate::results::Standing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One distance report, written once and never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub race_id: RaceId,
    pub user_id: UserId,
    /// Reported distance in meters
    pub distance: u32,
    pub timestamp: DateTime<Utc>,
}

/// The finished race and its standings, committed with the report that
/// completed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceFinish {
    pub race: Race,
    pub standings: Vec<Standing>,
}
