// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal-backed race store
//!
//! State lives in memory as a [`MaterializedState`]. Each mutation is
//! appended to the WAL first and only applied once the append succeeds, so a
//! failed write leaves the in-memory view untouched.

use crate::state::MaterializedState;
use crate::store::{RaceLock, RaceStore, StoreError};
use crate::wal::Wal;
use async_trait::async_trait;
use erg_core::{
    Operation, Participant, ParticipantStatus, ProgressUpdate, Race, RaceFinish, RaceId,
    RaceStatus, RaceToken, UserId,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

struct Journal {
    state: MaterializedState,
    wal: Option<Wal>,
}

impl Journal {
    fn commit(&mut self, op: Operation) -> Result<(), StoreError> {
        if let Some(wal) = self.wal.as_mut() {
            wal.append(&op)?;
        }
        self.state.apply(&op);
        Ok(())
    }
}

/// [`RaceStore`] over a materialized state and an optional WAL
///
/// Per-race lock entries are dropped once a race finishes.
#[derive(Clone)]
pub struct JournalStore {
    journal: Arc<Mutex<Journal>>,
    locks: Arc<Mutex<HashMap<RaceId, Arc<tokio::sync::Mutex<()>>>>>,
}

impl JournalStore {
    /// Volatile store with no WAL, for tests and throwaway runs
    pub fn in_memory() -> Self {
        Self::with_journal(Journal {
            state: MaterializedState::default(),
            wal: None,
        })
    }

    /// Open the WAL at `path`, replaying it into memory
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let ops = Wal::replay(path)?;
        let state = MaterializedState::from_operations(&ops);
        let wal = Wal::open(path)?;
        tracing::info!(
            path = %path.display(),
            operations = ops.len(),
            sequence = wal.sequence(),
            races = state.races.len(),
            "replayed race journal"
        );
        Ok(Self::with_journal(Journal {
            state,
            wal: Some(wal),
        }))
    }

    fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Arc::new(Mutex::new(journal)),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run a read-only closure against the current state
    pub fn with_state<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.journal().state)
    }

    fn journal(&self) -> MutexGuard<'_, Journal> {
        self.journal.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RaceStore for JournalStore {
    async fn lock_race(&self, race_id: RaceId) -> RaceLock {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(race_id).or_default())
        };
        RaceLock::new(race_id, mutex.lock_owned().await)
    }

    async fn allocate_race_id(&self) -> Result<RaceId, StoreError> {
        Ok(self.journal().state.next_race_id())
    }

    async fn insert_race(&self, race: &Race, creator: &Participant) -> Result<(), StoreError> {
        let mut journal = self.journal();
        if journal.state.race_by_token(&race.token).is_some() {
            return Err(StoreError::DuplicateRace(race.token.clone()));
        }
        journal.commit(Operation::RaceCreate {
            race: race.clone(),
            creator: creator.clone(),
        })
    }

    async fn race_by_token(&self, token: &RaceToken) -> Result<Option<Race>, StoreError> {
        Ok(self.journal().state.race_by_token(token).cloned())
    }

    async fn race_by_id(&self, race_id: RaceId) -> Result<Option<Race>, StoreError> {
        Ok(self.journal().state.race(race_id).cloned())
    }

    async fn races_in_status(&self, status: RaceStatus) -> Result<Vec<Race>, StoreError> {
        let journal = self.journal();
        Ok(journal
            .state
            .races
            .values()
            .filter(|race| race.status == status)
            .cloned()
            .collect())
    }

    async fn races_for_user(&self, user_id: UserId) -> Result<Vec<Race>, StoreError> {
        let journal = self.journal();
        let state = &journal.state;
        Ok(state
            .races
            .values()
            .filter(|race| state.participant(race.id, user_id).is_some())
            .cloned()
            .collect())
    }

    async fn update_race(&self, expected: RaceStatus, race: &Race) -> Result<bool, StoreError> {
        let mut journal = self.journal();
        let current = journal
            .state
            .race(race.id)
            .ok_or(StoreError::RaceNotFound(race.id))?;
        if current.status != expected {
            return Ok(false);
        }
        journal.commit(Operation::RaceUpdate { race: race.clone() })?;
        Ok(true)
    }

    async fn participants(&self, race_id: RaceId) -> Result<Vec<Participant>, StoreError> {
        Ok(self.journal().state.participants(race_id).to_vec())
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<bool, StoreError> {
        let mut journal = self.journal();
        if journal.state.race(participant.race_id).is_none() {
            return Err(StoreError::RaceNotFound(participant.race_id));
        }
        if journal
            .state
            .participant(participant.race_id, participant.user_id)
            .is_some()
        {
            return Ok(false);
        }
        journal.commit(Operation::ParticipantUpsert {
            participant: participant.clone(),
        })?;
        Ok(true)
    }

    async fn update_participant(
        &self,
        expected: ParticipantStatus,
        participant: &Participant,
    ) -> Result<bool, StoreError> {
        let mut journal = self.journal();
        let current = journal
            .state
            .participant(participant.race_id, participant.user_id)
            .ok_or(StoreError::ParticipantNotFound {
                race_id: participant.race_id,
                user_id: participant.user_id,
            })?;
        if current.status != expected {
            return Ok(false);
        }
        journal.commit(Operation::ParticipantUpsert {
            participant: participant.clone(),
        })?;
        Ok(true)
    }

    async fn record_progress(
        &self,
        update: &ProgressUpdate,
        expected: ParticipantStatus,
        participant: &Participant,
        finish: Option<&RaceFinish>,
    ) -> Result<bool, StoreError> {
        {
            let mut journal = self.journal();
            let current = journal
                .state
                .participant(participant.race_id, participant.user_id)
                .ok_or(StoreError::ParticipantNotFound {
                    race_id: participant.race_id,
                    user_id: participant.user_id,
                })?;
            if current.status != expected {
                return Ok(false);
            }
            if let Some(finish) = finish {
                let race = journal
                    .state
                    .race(finish.race.id)
                    .ok_or(StoreError::RaceNotFound(finish.race.id))?;
                if race.status != RaceStatus::Active {
                    return Ok(false);
                }
            }
            journal.commit(Operation::ProgressRecord {
                update: update.clone(),
                participant: participant.clone(),
                finish: finish.cloned(),
            })?;
        }

        if let Some(finish) = finish {
            // Finished races are read-only, so a caller that misses this
            // entry and takes a fresh mutex can only observe the final record
            self.locks
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&finish.race.id);
        }
        Ok(true)
    }

    async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, StoreError> {
        Ok(self.journal().state.progress(race_id).to_vec())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
