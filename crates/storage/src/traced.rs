// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{RaceLock, RaceStore, StoreError};
use async_trait::async_trait;
use erg_core::{
    Participant, ParticipantStatus, ProgressUpdate, Race, RaceFinish, RaceId, RaceStatus,
    RaceToken, UserId,
};
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any RaceStore
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn log_write<T: std::fmt::Debug>(result: &Result<T, StoreError>, start: Instant) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(value) => tracing::debug!(elapsed_ms, result = ?value, "committed"),
        Err(e) => tracing::error!(elapsed_ms, error = %e, "write failed"),
    }
}

#[async_trait]
impl<S: RaceStore> RaceStore for TracedStore<S> {
    async fn lock_race(&self, race_id: RaceId) -> RaceLock {
        let start = Instant::now();
        let lock = self.inner.lock_race(race_id).await;
        tracing::trace!(
            %race_id,
            waited_ms = start.elapsed().as_millis() as u64,
            "race lock acquired"
        );
        lock
    }

    async fn allocate_race_id(&self) -> Result<RaceId, StoreError> {
        self.inner.allocate_race_id().await
    }

    async fn insert_race(&self, race: &Race, creator: &Participant) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.insert_race", race_id = %race.id, token = %race.token);
        async {
            let start = Instant::now();
            let result = self.inner.insert_race(race, creator).await;
            log_write(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn race_by_token(&self, token: &RaceToken) -> Result<Option<Race>, StoreError> {
        let result = self.inner.race_by_token(token).await;
        tracing::trace!(%token, found = ?result.as_ref().map(Option::is_some).ok(), "race lookup");
        result
    }

    async fn race_by_id(&self, race_id: RaceId) -> Result<Option<Race>, StoreError> {
        let result = self.inner.race_by_id(race_id).await;
        tracing::trace!(%race_id, found = ?result.as_ref().map(Option::is_some).ok(), "race lookup");
        result
    }

    async fn races_in_status(&self, status: RaceStatus) -> Result<Vec<Race>, StoreError> {
        self.inner.races_in_status(status).await
    }

    async fn races_for_user(&self, user_id: UserId) -> Result<Vec<Race>, StoreError> {
        self.inner.races_for_user(user_id).await
    }

    async fn update_race(&self, expected: RaceStatus, race: &Race) -> Result<bool, StoreError> {
        let span = tracing::info_span!(
            "store.update_race",
            race_id = %race.id,
            from = %expected,
            to = %race.status
        );
        async {
            let start = Instant::now();
            let result = self.inner.update_race(expected, race).await;
            if let Ok(false) = result {
                tracing::info!("status guard lost to a concurrent writer");
            }
            log_write(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn participants(&self, race_id: RaceId) -> Result<Vec<Participant>, StoreError> {
        self.inner.participants(race_id).await
    }

    async fn insert_participant(&self, participant: &Participant) -> Result<bool, StoreError> {
        let span = tracing::info_span!(
            "store.insert_participant",
            race_id = %participant.race_id,
            user_id = %participant.user_id
        );
        async {
            let start = Instant::now();
            let result = self.inner.insert_participant(participant).await;
            log_write(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn update_participant(
        &self,
        expected: ParticipantStatus,
        participant: &Participant,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!(
            "store.update_participant",
            race_id = %participant.race_id,
            user_id = %participant.user_id,
            from = %expected,
            to = %participant.status,
            distance = participant.distance
        );
        async {
            let start = Instant::now();
            let result = self.inner.update_participant(expected, participant).await;
            log_write(&result, start);
            result
        }
        .instrument(span)
        .await
    }

    async fn record_progress(
        &self,
        update: &ProgressUpdate,
        expected: ParticipantStatus,
        participant: &Participant,
        finish: Option<&RaceFinish>,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!(
            "store.record_progress",
            race_id = %update.race_id,
            user_id = %update.user_id,
            distance = update.distance,
            to = %participant.status,
            finishers = ?finish.map(|f| f.standings.len())
        );
        async {
            let start = Instant::now();
            let result = self
                .inner
                .record_progress(update, expected, participant, finish)
                .await;
            log_write(&result, start);
            if let (Ok(true), Some(finish)) = (&result, finish) {
                tracing::info!(
                    race_id = %finish.race.id,
                    finishers = finish.standings.len(),
                    "race results recorded"
                );
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, StoreError> {
        self.inner.progress_log(race_id).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
