// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress coordinator
//!
//! Ingests distance reports, finishes participants who reach the target and
//! finishes the race when the last one does. The whole report, including
//! completion detection, runs under the race lock so the result calculator
//! runs at most once per race. A report is committed in a single store write
//! together with the participant it moves and, for the last finisher, the
//! finished race and its standings.

use crate::engine::RaceEngine;
use crate::error::RaceError;
use erg_core::{
    compute_standings, Clock, Event, Finisher, IdGen, Participant, ParticipantEvent,
    ParticipantStatus, ProgressUpdate, Race, RaceEvent, RaceFinish, RaceId, UserId,
};
use erg_storage::RaceStore;

impl<S, C, I> RaceEngine<S, C, I>
where
    S: RaceStore,
    C: Clock,
    I: IdGen,
{
    /// Record a distance report for a racing participant
    pub async fn report_progress(
        &self,
        race_id: RaceId,
        user_id: UserId,
        distance: i64,
    ) -> Result<(), RaceError> {
        let distance = u32::try_from(distance).map_err(|_| RaceError::InvalidDistance(distance))?;

        let _lock = self.store.lock_race(race_id).await;
        let race = self.require_race(race_id).await?;
        if !race.is_active() {
            return Err(RaceError::InvalidStatus {
                race_id,
                status: race.status,
                action: "accept progress",
            });
        }

        let participants = self.store.participants(race_id).await?;
        let participant = participants
            .iter()
            .find(|p| p.user_id == user_id)
            .ok_or(RaceError::NotParticipant { race_id, user_id })?;

        let finishing = distance >= race.distance;
        let event = if finishing {
            let already = participants.iter().filter(|p| p.is_finished()).count();
            ParticipantEvent::Finish {
                distance,
                order: u32::try_from(already + 1).unwrap_or(u32::MAX),
            }
        } else {
            ParticipantEvent::Advance { distance }
        };
        let (next, mut events) = participant.transition(event, &self.clock)?;
        let update = ProgressUpdate {
            race_id,
            user_id,
            distance,
            timestamp: next.finished_at.unwrap_or_else(|| self.clock.now()),
        };

        let completion = if finishing {
            let roster: Vec<Participant> = participants
                .iter()
                .map(|p| if p.user_id == user_id { next.clone() } else { p.clone() })
                .collect();
            self.detect_race_completion(&race, &roster)?
        } else {
            None
        };

        let finish = completion.as_ref().map(|(finish, _)| finish);
        if !self
            .store
            .record_progress(&update, ParticipantStatus::Racing, &next, finish)
            .await?
        {
            return Err(RaceError::Conflict(race_id));
        }

        if let Some((_, finish_events)) = completion {
            events.extend(finish_events);
        }
        self.publish(&events);
        Ok(())
    }

    /// The finished race and its standings once every participant is done
    ///
    /// `roster` must already include the report being recorded. Nothing is
    /// written here; the caller commits the finish with that report.
    fn detect_race_completion(
        &self,
        race: &Race,
        roster: &[Participant],
    ) -> Result<Option<(RaceFinish, Vec<Event>)>, RaceError> {
        let total = roster.len();
        let finished = roster.iter().filter(|p| p.is_finished()).count();
        if finished != total {
            tracing::debug!(race_id = %race.id, finished, total, "race still running");
            return Ok(None);
        }

        let finishers: Vec<Finisher> = roster.iter().map(Finisher::from).collect();
        let standings =
            compute_standings(race.started_at, race.distance, &finishers).map_err(|e| {
                tracing::error!(race_id = %race.id, error = %e, "result calculation failed");
                RaceError::Results(e)
            })?;

        let (done, mut events) = race.transition(RaceEvent::Finish, &self.clock)?;
        events.push(Event::ResultsPublished {
            race_id: race.id,
            finishers: standings.len(),
        });
        Ok(Some((
            RaceFinish {
                race: done,
                standings,
            },
            events,
        )))
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
