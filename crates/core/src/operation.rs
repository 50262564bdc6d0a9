// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operations for the write-ahead log

use crate::participant::Participant;
use crate::progress::{ProgressUpdate, RaceFinish};
use crate::race::{Race, RaceId};
use serde::{Deserialize, Serialize};

/// Operations that can be persisted to the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create a race together with its creator's participant record
    RaceCreate {
        race: Race,
        creator: Participant,
    },

    /// Replace a race record after a status transition
    RaceUpdate { race: Race },

    /// Insert or replace a participant record
    ParticipantUpsert { participant: Participant },

    /// Append a progress report and replace the participant it moved
    ///
    /// A report that completes the race also carries the finished race and
    /// its standings, so they land in the same entry.
    ProgressRecord {
        update: ProgressUpdate,
        participant: Participant,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        finish: Option<RaceFinish>,
    },
}

impl Operation {
    pub fn race_id(&self) -> RaceId {
        match self {
            Operation::RaceCreate { race, .. } | Operation::RaceUpdate { race } => race.id,
            Operation::ParticipantUpsert { participant } => participant.race_id,
            Operation::ProgressRecord { update, .. } => update.race_id,
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
