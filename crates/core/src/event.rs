// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events produced by race and participant transitions
//!
//! Nothing in the core pushes these anywhere; the engine logs them and hands
//! them back so an outer layer can broadcast them if it wants to.

use crate::race::{RaceId, RaceToken, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    RaceCreated {
        race_id: RaceId,
        token: RaceToken,
        distance: u32,
        created_by: UserId,
    },
    ParticipantJoined {
        race_id: RaceId,
        user_id: UserId,
    },
    ReadinessChanged {
        race_id: RaceId,
        user_id: UserId,
        ready: bool,
    },
    CountdownScheduled {
        race_id: RaceId,
        deadline: DateTime<Utc>,
    },
    RaceStarted {
        race_id: RaceId,
        started_at: DateTime<Utc>,
    },
    ParticipantStarted {
        race_id: RaceId,
        user_id: UserId,
    },
    ProgressRecorded {
        race_id: RaceId,
        user_id: UserId,
        distance: u32,
    },
    ParticipantFinished {
        race_id: RaceId,
        user_id: UserId,
        finished_at: DateTime<Utc>,
    },
    RaceFinished {
        race_id: RaceId,
        finished_at: DateTime<Utc>,
    },
    ResultsPublished {
        race_id: RaceId,
        finishers: usize,
    },
}

impl Event {
    /// Stable `noun:verb` name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            Event::RaceCreated { .. } => "race:created",
            Event::ParticipantJoined { .. } => "participant:joined",
            Event::ReadinessChanged { .. } => "participant:readiness",
            Event::CountdownScheduled { .. } => "race:countdown",
            Event::RaceStarted { .. } => "race:started",
            Event::ParticipantStarted { .. } => "participant:racing",
            Event::ProgressRecorded { .. } => "participant:progress",
            Event::ParticipantFinished { .. } => "participant:finished",
            Event::RaceFinished { .. } => "race:finished",
            Event::ResultsPublished { .. } => "race:results",
        }
    }

    pub fn race_id(&self) -> RaceId {
        match self {
            Event::RaceCreated { race_id, .. }
            | Event::ParticipantJoined { race_id, .. }
            | Event::ReadinessChanged { race_id, .. }
            | Event::CountdownScheduled { race_id, .. }
            | Event::RaceStarted { race_id, .. }
            | Event::ParticipantStarted { race_id, .. }
            | Event::ProgressRecorded { race_id, .. }
            | Event::ParticipantFinished { race_id, .. }
            | Event::RaceFinished { race_id, .. }
            | Event::ResultsPublished { race_id, .. } => *race_id,
        }
    }
}
