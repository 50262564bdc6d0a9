// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake race store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use crate::journal::JournalStore;
use crate::store::{RaceLock, RaceStore, StoreError};
use async_trait::async_trait;
use erg_core::{
    Participant, ParticipantStatus, ProgressUpdate, Race, RaceFinish, RaceId, RaceStatus,
    RaceToken, UserId,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Store writes that can be failed on their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    InsertRace,
    UpdateRace,
    InsertParticipant,
    UpdateParticipant,
    RecordProgress,
}

/// Recorded write call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    InsertRace {
        race_id: RaceId,
    },
    UpdateRace {
        race_id: RaceId,
        expected: RaceStatus,
        to: RaceStatus,
        applied: bool,
    },
    InsertParticipant {
        race_id: RaceId,
        user_id: UserId,
    },
    UpdateParticipant {
        race_id: RaceId,
        user_id: UserId,
        expected: ParticipantStatus,
        to: ParticipantStatus,
        applied: bool,
    },
    RecordProgress {
        race_id: RaceId,
        user_id: UserId,
        distance: u32,
        to: ParticipantStatus,
        /// Standings written with the report, if it finished the race
        finishers: Option<usize>,
        applied: bool,
    },
}

/// In-memory store that records writes and can be told to fail them
#[derive(Clone)]
pub struct FakeStore {
    inner: JournalStore,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    fail_writes: Arc<AtomicBool>,
    failing: Arc<Mutex<HashSet<WriteKind>>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            inner: JournalStore::in_memory(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
            failing: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Get all recorded write calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&StoreCall) -> bool) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|call| pred(call))
            .count()
    }

    /// Make every subsequent write fail with `StoreError::Unavailable`
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make writes of `kind` fail until [`FakeStore::clear_failures`]
    pub fn fail_writes_of(&self, kind: WriteKind) {
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind);
    }

    pub fn clear_failures(&self) {
        self.set_fail_writes(false);
        self.failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    fn record(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }

    fn check_writable(&self, kind: WriteKind) -> Result<(), StoreError> {
        let selected = self
            .failing
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&kind);
        if selected || self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RaceStore for FakeStore {
    async fn lock_race(&self, race_id: RaceId) -> RaceLock {
        self.inner.lock_race(race_id).await
    }

    async fn allocate_race_id(&self) -> Result<RaceId, StoreError> {
        self.inner.allocate_race_id().await
    }

    async fn insert_race(&self, race: &Race, creator: &Participant) -> Result<(), StoreError> {
        self.check_writable(WriteKind::InsertRace)?;
        self.inner.insert_race(race, creator).await?;
        self.record(StoreCall::InsertRace { race_id: race.id });
        Ok(())
    }

    async fn race_by_token(&self, token: &RaceToken) -> Result<Option<Race>, StoreError> {
        self.inner.race_by_token(token).await
    }

    async fn race_by_id(&self, race_id: RaceId) -> Result<Option<Race>, StoreError> {
        self.inner.race_by_id(race_id).await
    }

    async fn races_in_status(&self, status: RaceStatus) -> Result<Vec<Race>, StoreError> {
        self.inner.races_in_status(status).await
    }

    async fn races_for_user(&self, user_id: UserId) -> Result<Vec<Race>, StoreError> {
        self.inner.races_for_user(user_id).await
    }

    async fn update_race(&self, expected: RaceStatus, race: &Race) -> Result<bool, StoreError> {
        self.check_writable(WriteKind::UpdateRace)?;
        let applied = self.inner.update_race(expected, race).await?;
        self.record(StoreCall::UpdateRace {
            race_id: race.id,
            expected,
            to: race.status,
            applied,
        });
        Ok(applied)
    }

    async fn participants(&self, race_id: RaceId) -> Result<Vec<Participant>, StoreError> {
        self.inner.participants(race_id).await
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<bool, StoreError> {
        self.check_writable(WriteKind::InsertParticipant)?;
        let inserted = self.inner.insert_participant(participant).await?;
        if inserted {
            self.record(StoreCall::InsertParticipant {
                race_id: participant.race_id,
                user_id: participant.user_id,
            });
        }
        Ok(inserted)
    }

    async fn update_participant(
        &self,
        expected: ParticipantStatus,
        participant: &Participant,
    ) -> Result<bool, StoreError> {
        self.check_writable(WriteKind::UpdateParticipant)?;
        let applied = self.inner.update_participant(expected, participant).await?;
        self.record(StoreCall::UpdateParticipant {
            race_id: participant.race_id,
            user_id: participant.user_id,
            expected,
            to: participant.status,
            applied,
        });
        Ok(applied)
    }

    async fn record_progress(
        &self,
        update: &ProgressUpdate,
        expected: ParticipantStatus,
        participant: &Participant,
        finish: Option<&RaceFinish>,
    ) -> Result<bool, StoreError> {
        self.check_writable(WriteKind::RecordProgress)?;
        let applied = self
            .inner
            .record_progress(update, expected, participant, finish)
            .await?;
        self.record(StoreCall::RecordProgress {
            race_id: update.race_id,
            user_id: update.user_id,
            distance: update.distance,
            to: participant.status,
            finishers: finish.map(|f| f.standings.len()),
            applied,
        });
        Ok(applied)
    }

    async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, StoreError> {
        self.inner.progress_log(race_id).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
