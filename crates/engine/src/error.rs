// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the race engine

use erg_core::{
    ParticipantError, RaceId, RaceStatus, RaceToken, ResultError, TransitionError, UserId,
};
use erg_storage::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Closed set of failure categories exposed to request handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    InvalidState,
    Conflict,
    StorageFailure,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StorageFailure => "storage_failure",
            ErrorKind::Internal => "internal",
        }
    }

    /// True when the caller can fix the request and try again
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ErrorKind::InvalidInput | ErrorKind::NotFound | ErrorKind::InvalidState
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in race operations
#[derive(Debug, Error)]
pub enum RaceError {
    #[error("race distance must be at least {min} meters, got {got}")]
    DistanceTooShort { min: u32, got: i64 },
    #[error("distance must be a non-negative number of meters, got {0}")]
    InvalidDistance(i64),
    #[error("no race with token {0}")]
    TokenNotFound(RaceToken),
    #[error("race not found: {0}")]
    RaceNotFound(RaceId),
    #[error("user {user_id} has not joined race {race_id}")]
    NotParticipant { race_id: RaceId, user_id: UserId },
    #[error("race {race_id} has already started ({status})")]
    RaceAlreadyStarted { race_id: RaceId, status: RaceStatus },
    #[error("race {race_id} is {status} and cannot {action}")]
    InvalidStatus {
        race_id: RaceId,
        status: RaceStatus,
        action: &'static str,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Participant(#[from] ParticipantError),
    #[error("race {0} was modified concurrently")]
    Conflict(RaceId),
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("result calculation failed: {0}")]
    Results(#[from] ResultError),
}

impl RaceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RaceError::DistanceTooShort { .. } | RaceError::InvalidDistance(_) => {
                ErrorKind::InvalidInput
            }
            RaceError::Participant(ParticipantError::DistanceRegressed { .. }) => {
                ErrorKind::InvalidInput
            }
            RaceError::TokenNotFound(_)
            | RaceError::RaceNotFound(_)
            | RaceError::NotParticipant { .. } => ErrorKind::NotFound,
            RaceError::RaceAlreadyStarted { .. }
            | RaceError::InvalidStatus { .. }
            | RaceError::Participant(ParticipantError::Illegal { .. }) => ErrorKind::InvalidState,
            RaceError::Transition(TransitionError::Illegal { .. }) => ErrorKind::InvalidState,
            RaceError::Transition(TransitionError::CountdownOutOfRange(_)) => ErrorKind::Internal,
            RaceError::Conflict(_) => ErrorKind::Conflict,
            RaceError::Store(StoreError::DuplicateRace(_)) => ErrorKind::Conflict,
            RaceError::Store(StoreError::RaceNotFound(_))
            | RaceError::Store(StoreError::ParticipantNotFound { .. }) => ErrorKind::NotFound,
            RaceError::Store(StoreError::Wal(_)) | RaceError::Store(StoreError::Unavailable(_)) => {
                ErrorKind::StorageFailure
            }
            RaceError::Results(_) => ErrorKind::Internal,
        }
    }

    /// Message safe to hand to a client
    ///
    /// Storage and internal failures are reported generically; the detail
    /// stays in the logs.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::StorageFailure => "storage is temporarily unavailable".to_string(),
            ErrorKind::Internal => "internal error".to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
