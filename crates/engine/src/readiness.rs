// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness coordinator
//!
//! Tracks who is ready and schedules the countdown once every participant of
//! a multi-person race is. The countdown deadline is only stored here;
//! starting the race when it passes is the caller's job
//! (see [`RaceEngine::start_due_races`]).

use crate::engine::RaceEngine;
use crate::error::RaceError;
use erg_core::{Clock, IdGen, ParticipantEvent, RaceEvent, RaceId, RaceStatus, UserId};
use erg_storage::RaceStore;

impl<S, C, I> RaceEngine<S, C, I>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    /// Mark a participant ready or not ready
    ///
    /// Only allowed while the race is waiting. Does not by itself change the
    /// race status; follow with [`RaceEngine::evaluate_countdown`].
    pub async fn set_ready(
        &self,
        race_id: RaceId,
        user_id: UserId,
        ready: bool,
    ) -> Result<(), RaceError> {
        let _lock = self.store.lock_race(race_id).await;
        let race = self.require_race(race_id).await?;
        if !race.is_waiting() {
            return Err(RaceError::InvalidStatus {
                race_id,
                status: race.status,
                action: "change readiness",
            });
        }

        let participant = self
            .store
            .participants(race_id)
            .await?
            .into_iter()
            .find(|p| p.user_id == user_id)
            .ok_or(RaceError::NotParticipant { race_id, user_id })?;

        let (next, events) = participant.transition(ParticipantEvent::SetReady { ready }, &self.clock)?;
        if next.status == participant.status {
            tracing::debug!(%race_id, %user_id, ready, "readiness unchanged");
            return Ok(());
        }
        if !self
            .store
            .update_participant(participant.status, &next)
            .await?
        {
            return Err(RaceError::Conflict(race_id));
        }

        self.publish(&events);
        Ok(())
    }

    /// Schedule the countdown if every participant of a multi-person race is ready
    ///
    /// Returns `true` only for the call that moved the race into countdown.
    /// A race with a single participant never starts on its own.
    pub async fn evaluate_countdown(&self, race_id: RaceId) -> Result<bool, RaceError> {
        let _lock = self.store.lock_race(race_id).await;
        let race = self.require_race(race_id).await?;
        if !race.is_waiting() {
            tracing::trace!(%race_id, status = %race.status, "countdown already decided");
            return Ok(false);
        }

        let participants = self.store.participants(race_id).await?;
        let total = participants.len();
        let ready = participants.iter().filter(|p| p.is_ready()).count();
        if total <= 1 || ready != total {
            tracing::debug!(%race_id, total, ready, "not everyone is ready");
            return Ok(false);
        }

        let (scheduled, events) = race.transition(
            RaceEvent::ScheduleCountdown {
                duration: self.config.countdown,
            },
            &self.clock,
        )?;
        if !self
            .store
            .update_race(RaceStatus::Waiting, &scheduled)
            .await?
        {
            tracing::debug!(%race_id, "countdown already scheduled by another caller");
            return Ok(false);
        }

        self.publish(&events);
        Ok(true)
    }
}

#[cfg(test)]
#[path = "readiness_tests.rs"]
mod tests;
