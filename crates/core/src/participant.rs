// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Participant state machine
//!
//! A participant is one user's membership in a race. Status moves
//! `NotReady <-> Ready -> Racing -> Finished`; distance never decreases.

use crate::clock::Clock;
use crate::event::Event;
use crate::race::{RaceId, UserId};
use crate::results::Pace;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Status of a participant within a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    NotReady,
    Ready,
    Racing,
    Finished,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::NotReady => "not_ready",
            ParticipantStatus::Ready => "ready",
            ParticipantStatus::Racing => "racing",
            ParticipantStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for ParticipantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that drive the participant state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantEvent {
    /// Toggle readiness before the race starts
    SetReady { ready: bool },
    /// The race went active while this participant was ready
    StartRacing,
    /// Distance report below the target
    Advance { distance: u32 },
    /// Distance report at or beyond the target; `order` is the arrival rank
    Finish { distance: u32, order: u32 },
}

/// Rejected participant transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParticipantError {
    #[error("participant {user_id} is {status} and cannot {action}")]
    Illegal {
        user_id: UserId,
        status: ParticipantStatus,
        action: &'static str,
    },
    #[error("distance {reported} is below previously recorded {previous}")]
    DistanceRegressed { previous: u32, reported: u32 },
}

/// A user's membership and progress record within one race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub race_id: RaceId,
    pub user_id: UserId,
    pub status: ParticipantStatus,
    /// Latest reported distance in meters
    pub distance: u32,
    pub finished_at: Option<DateTime<Utc>>,
    /// 1-based arrival rank of the finishing update
    pub finish_order: Option<u32>,
    pub pace: Option<Pace>,
    pub position: Option<u32>,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    /// Create a new participant in the NotReady state
    pub fn new(race_id: RaceId, user_id: UserId, clock: &impl Clock) -> Self {
        Participant {
            race_id,
            user_id,
            status: ParticipantStatus::NotReady,
            distance: 0,
            finished_at: None,
            finish_order: None,
            pace: None,
            position: None,
            joined_at: clock.now(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status == ParticipantStatus::Ready
    }

    pub fn is_finished(&self) -> bool {
        self.status == ParticipantStatus::Finished
    }

    fn illegal(&self, action: &'static str) -> ParticipantError {
        ParticipantError::Illegal {
            user_id: self.user_id,
            status: self.status,
            action,
        }
    }

    /// Pure transition function - returns the new participant and its events
    pub fn transition(
        &self,
        event: ParticipantEvent,
        clock: &impl Clock,
    ) -> Result<(Participant, Vec<Event>), ParticipantError> {
        match (self.status, event) {
            // NotReady ↔ Ready
            (
                ParticipantStatus::NotReady | ParticipantStatus::Ready,
                ParticipantEvent::SetReady { ready },
            ) => {
                let status = if ready {
                    ParticipantStatus::Ready
                } else {
                    ParticipantStatus::NotReady
                };
                let participant = Participant {
                    status,
                    ..self.clone()
                };
                let events = vec![Event::ReadinessChanged {
                    race_id: self.race_id,
                    user_id: self.user_id,
                    ready,
                }];
                Ok((participant, events))
            }
            (_, ParticipantEvent::SetReady { .. }) => Err(self.illegal("change readiness")),

            // Ready → Racing
            (ParticipantStatus::Ready, ParticipantEvent::StartRacing) => {
                let participant = Participant {
                    status: ParticipantStatus::Racing,
                    ..self.clone()
                };
                let events = vec![Event::ParticipantStarted {
                    race_id: self.race_id,
                    user_id: self.user_id,
                }];
                Ok((participant, events))
            }
            (_, ParticipantEvent::StartRacing) => Err(self.illegal("start racing")),

            // Racing: distance moves forward
            (ParticipantStatus::Racing, ParticipantEvent::Advance { distance }) => {
                self.check_monotonic(distance)?;
                let participant = Participant {
                    distance,
                    ..self.clone()
                };
                let events = vec![Event::ProgressRecorded {
                    race_id: self.race_id,
                    user_id: self.user_id,
                    distance,
                }];
                Ok((participant, events))
            }

            // Racing → Finished
            (ParticipantStatus::Racing, ParticipantEvent::Finish { distance, order }) => {
                self.check_monotonic(distance)?;
                let now = clock.now();
                let participant = Participant {
                    status: ParticipantStatus::Finished,
                    distance,
                    finished_at: Some(now),
                    finish_order: Some(order),
                    ..self.clone()
                };
                let events = vec![
                    Event::ProgressRecorded {
                        race_id: self.race_id,
                        user_id: self.user_id,
                        distance,
                    },
                    Event::ParticipantFinished {
                        race_id: self.race_id,
                        user_id: self.user_id,
                        finished_at: now,
                    },
                ];
                Ok((participant, events))
            }
            (_, ParticipantEvent::Advance { .. } | ParticipantEvent::Finish { .. }) => {
                Err(self.illegal("report progress"))
            }
        }
    }

    fn check_monotonic(&self, reported: u32) -> Result<(), ParticipantError> {
        if reported < self.distance {
            return Err(ParticipantError::DistanceRegressed {
                previous: self.distance,
                reported,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "participant_tests.rs"]
mod tests;
