// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-access contract for race and participant records
//!
//! Every mutation of an existing record is a compare-and-swap guarded by the
//! status the caller last observed. A `false` return means another writer got
//! there first; callers re-read instead of retrying blindly.

use crate::wal::WalError;
use async_trait::async_trait;
use erg_core::{
    Participant, ParticipantStatus, ProgressUpdate, Race, RaceFinish, RaceId, RaceStatus,
    RaceToken, UserId,
};
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("write-ahead log failed: {0}")]
    Wal(#[from] WalError),
    #[error("race token already in use: {0}")]
    DuplicateRace(RaceToken),
    #[error("race not found: {0}")]
    RaceNotFound(RaceId),
    #[error("participant {user_id} not found in race {race_id}")]
    ParticipantNotFound { race_id: RaceId, user_id: UserId },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Exclusive hold on one race for the duration of a unit of work
///
/// Released on drop.
pub struct RaceLock {
    race_id: RaceId,
    _guard: tokio::sync::OwnedMutexGuard<()>,
}

impl RaceLock {
    pub fn new(race_id: RaceId, guard: tokio::sync::OwnedMutexGuard<()>) -> Self {
        Self {
            race_id,
            _guard: guard,
        }
    }

    pub fn race_id(&self) -> RaceId {
        self.race_id
    }
}

impl std::fmt::Debug for RaceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaceLock")
            .field("race_id", &self.race_id)
            .finish()
    }
}

/// Durable keyed storage for races, participants and progress
#[async_trait]
pub trait RaceStore: Clone + Send + Sync + 'static {
    /// Serialize units of work on one race
    async fn lock_race(&self, race_id: RaceId) -> RaceLock;

    /// Reserve a fresh internal race key
    async fn allocate_race_id(&self) -> Result<RaceId, StoreError>;

    /// Insert a new race together with its creator's participant record
    async fn insert_race(&self, race: &Race, creator: &Participant) -> Result<(), StoreError>;

    async fn race_by_token(&self, token: &RaceToken) -> Result<Option<Race>, StoreError>;

    async fn race_by_id(&self, race_id: RaceId) -> Result<Option<Race>, StoreError>;

    /// Races currently in `status`, ordered by id
    async fn races_in_status(&self, status: RaceStatus) -> Result<Vec<Race>, StoreError>;

    /// Races the user has joined, ordered by id
    async fn races_for_user(&self, user_id: UserId) -> Result<Vec<Race>, StoreError>;

    /// Replace a race record if its stored status still equals `expected`
    async fn update_race(&self, expected: RaceStatus, race: &Race) -> Result<bool, StoreError>;

    /// Participants of a race in join order
    async fn participants(&self, race_id: RaceId) -> Result<Vec<Participant>, StoreError>;

    /// Insert a participant; returns `false` if the user already joined
    async fn insert_participant(&self, participant: &Participant) -> Result<bool, StoreError>;

    /// Replace a participant if its stored status still equals `expected`
    async fn update_participant(
        &self,
        expected: ParticipantStatus,
        participant: &Participant,
    ) -> Result<bool, StoreError>;

    /// Append a progress report and replace its participant in one write
    ///
    /// The participant swap is guarded by `expected`. A `finish` also moves
    /// the race out of `active` and records its standings in the same write.
    /// Returns `false` and writes nothing if either guard fails.
    async fn record_progress(
        &self,
        update: &ProgressUpdate,
        expected: ParticipantStatus,
        participant: &Participant,
        finish: Option<&RaceFinish>,
    ) -> Result<bool, StoreError>;

    /// Progress audit trail of a race in append order
    async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, StoreError>;
}
