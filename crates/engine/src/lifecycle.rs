// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race lifecycle: creation, joining, the countdown-to-active edge and reads

use crate::engine::{RaceEngine, RaceHistoryEntry, RaceSnapshot};
use crate::error::RaceError;
use erg_core::{
    Clock, Event, IdGen, Participant, ParticipantEvent, ProgressUpdate, Race, RaceEvent, RaceId,
    RaceStatus, RaceToken, UserId,
};
use erg_storage::RaceStore;
use std::cmp::Reverse;

impl<S, C, I> RaceEngine<S, C, I>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    /// Create a race in `waiting` with the creator as its only participant
    pub async fn create_race(&self, creator: UserId, distance: i64) -> Result<Race, RaceError> {
        let min = self.config.min_distance;
        if distance < i64::from(min) {
            return Err(RaceError::DistanceTooShort { min, got: distance });
        }
        let distance = u32::try_from(distance).map_err(|_| RaceError::InvalidDistance(distance))?;

        let race_id = self.store.allocate_race_id().await?;
        let race = Race::new(
            race_id,
            self.id_gen.next_token(),
            distance,
            creator,
            &self.clock,
        );
        let participant = Participant::new(race_id, creator, &self.clock);
        self.store.insert_race(&race, &participant).await?;

        self.publish(&[
            Event::RaceCreated {
                race_id,
                token: race.token.clone(),
                distance,
                created_by: creator,
            },
            Event::ParticipantJoined {
                race_id,
                user_id: creator,
            },
        ]);
        Ok(race)
    }

    /// Join a waiting race; joining twice is a no-op
    pub async fn join_race(&self, token: &RaceToken, user_id: UserId) -> Result<(), RaceError> {
        let found = self
            .store
            .race_by_token(token)
            .await?
            .ok_or_else(|| RaceError::TokenNotFound(token.clone()))?;

        let _lock = self.store.lock_race(found.id).await;
        let race = self.require_race(found.id).await?;
        if !race.is_waiting() {
            return Err(RaceError::RaceAlreadyStarted {
                race_id: race.id,
                status: race.status,
            });
        }

        let participant = Participant::new(race.id, user_id, &self.clock);
        if self.store.insert_participant(&participant).await? {
            self.publish(&[Event::ParticipantJoined {
                race_id: race.id,
                user_id,
            }]);
        } else {
            tracing::debug!(race_id = %race.id, %user_id, "already joined");
        }
        Ok(())
    }

    /// Move a race from `countdown` to `active` and start every ready participant
    ///
    /// Safe to call redundantly: once the race is active or finished this is
    /// a no-op, and a caller that loses the status guard backs off quietly.
    pub async fn transition_to_active(&self, race_id: RaceId) -> Result<(), RaceError> {
        let _lock = self.store.lock_race(race_id).await;
        let race = self.require_race(race_id).await?;

        match race.status {
            RaceStatus::Countdown => {}
            RaceStatus::Waiting => {
                return Err(RaceError::InvalidStatus {
                    race_id,
                    status: race.status,
                    action: "start before its countdown",
                });
            }
            RaceStatus::Active | RaceStatus::Finished => {
                tracing::debug!(%race_id, status = %race.status, "race already started");
                return Ok(());
            }
        }

        let (started, mut events) = race.transition(RaceEvent::Start, &self.clock)?;
        if !self
            .store
            .update_race(RaceStatus::Countdown, &started)
            .await?
        {
            tracing::debug!(%race_id, "start already performed by another caller");
            return Ok(());
        }

        for participant in self.store.participants(race_id).await? {
            if !participant.is_ready() {
                continue;
            }
            let (racing, started_events) =
                participant.transition(ParticipantEvent::StartRacing, &self.clock)?;
            if !self
                .store
                .update_participant(participant.status, &racing)
                .await?
            {
                return Err(RaceError::Conflict(race_id));
            }
            events.extend(started_events);
        }

        self.publish(&events);
        Ok(())
    }

    /// Start every counting-down race whose deadline has passed
    ///
    /// Failures are logged per race and do not stop the sweep. Returns the
    /// races this call observed as started.
    pub async fn start_due_races(&self) -> Result<Vec<RaceId>, RaceError> {
        let now = self.clock.now();
        let due: Vec<RaceId> = self
            .store
            .races_in_status(RaceStatus::Countdown)
            .await?
            .into_iter()
            .filter(|race| race.countdown_elapsed(now))
            .map(|race| race.id)
            .collect();

        let mut started = Vec::with_capacity(due.len());
        for race_id in due {
            match self.transition_to_active(race_id).await {
                Ok(()) => started.push(race_id),
                Err(e) => tracing::warn!(%race_id, error = %e, "countdown expiry failed"),
            }
        }
        Ok(started)
    }

    /// Look up a race and its participants by external token
    pub async fn get_race(&self, token: &RaceToken) -> Result<RaceSnapshot, RaceError> {
        let race = self
            .store
            .race_by_token(token)
            .await?
            .ok_or_else(|| RaceError::TokenNotFound(token.clone()))?;
        let participants = self.store.participants(race.id).await?;
        Ok(RaceSnapshot { race, participants })
    }

    /// Look up a race and its participants by internal key
    pub async fn get_race_by_id(&self, race_id: RaceId) -> Result<RaceSnapshot, RaceError> {
        let race = self.require_race(race_id).await?;
        let participants = self.store.participants(race_id).await?;
        Ok(RaceSnapshot { race, participants })
    }

    /// Every race the user joined, newest first
    pub async fn race_history(&self, user_id: UserId) -> Result<Vec<RaceHistoryEntry>, RaceError> {
        let mut races = self.store.races_for_user(user_id).await?;
        races.sort_by_key(|race| Reverse((race.created_at, race.id)));

        let mut history = Vec::with_capacity(races.len());
        for race in races {
            let mut participants = self.store.participants(race.id).await?;
            let Some(entry) = participants.iter().find(|p| p.user_id == user_id).cloned() else {
                continue;
            };
            participants.sort_by_key(|p| (p.position.is_none(), p.position, p.joined_at));
            history.push(RaceHistoryEntry {
                race,
                entry,
                participants,
            });
        }
        Ok(history)
    }

    /// Progress audit trail of a race in the order reports arrived
    pub async fn progress_log(&self, race_id: RaceId) -> Result<Vec<ProgressUpdate>, RaceError> {
        self.require_race(race_id).await?;
        Ok(self.store.progress_log(race_id).await?)
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
