// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Race state machine
//!
//! A race moves strictly forward through
//! `Waiting -> Countdown -> Active -> Finished`. Each edge stamps exactly one
//! timestamp, and every other edge is rejected by [`Race::transition`].

use crate::clock::Clock;
use crate::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Internal key of a race, assigned by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceId(pub u64);

impl fmt::Display for RaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque external-facing race handle, shared with people invited to join
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RaceToken(pub String);

impl RaceToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RaceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RaceToken {
    fn from(s: String) -> Self {
        RaceToken(s)
    }
}

impl From<&str> for RaceToken {
    fn from(s: &str) -> Self {
        RaceToken(s.to_string())
    }
}

/// Authenticated user identifier, resolved by the request layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceStatus {
    Waiting,
    Countdown,
    Active,
    Finished,
}

impl RaceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RaceStatus::Waiting => "waiting",
            RaceStatus::Countdown => "countdown",
            RaceStatus::Active => "active",
            RaceStatus::Finished => "finished",
        }
    }

    /// The single legal successor of this status
    pub fn next(self) -> Option<RaceStatus> {
        match self {
            RaceStatus::Waiting => Some(RaceStatus::Countdown),
            RaceStatus::Countdown => Some(RaceStatus::Active),
            RaceStatus::Active => Some(RaceStatus::Finished),
            RaceStatus::Finished => None,
        }
    }

    pub fn can_transition_to(self, to: RaceStatus) -> bool {
        self.next() == Some(to)
    }
}

impl fmt::Display for RaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs that drive the race state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceEvent {
    /// Every participant is ready; start counting down
    ScheduleCountdown { duration: Duration },
    /// Countdown has elapsed
    Start,
    /// Last participant crossed the line
    Finish,
}

impl RaceEvent {
    /// Status this event moves the race into
    pub fn target(&self) -> RaceStatus {
        match self {
            RaceEvent::ScheduleCountdown { .. } => RaceStatus::Countdown,
            RaceEvent::Start => RaceStatus::Active,
            RaceEvent::Finish => RaceStatus::Finished,
        }
    }
}

/// Rejected race transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("race {race_id} cannot move from {from} to {to}")]
    Illegal {
        race_id: RaceId,
        from: RaceStatus,
        to: RaceStatus,
    },
    #[error("countdown duration out of range: {0:?}")]
    CountdownOutOfRange(Duration),
}

/// A single timed competition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Race {
    pub id: RaceId,
    pub token: RaceToken,
    /// Target distance in meters
    pub distance: u32,
    pub status: RaceStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    /// Deadline after which the race may start
    pub countdown_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Race {
    /// Create a new race in the Waiting state
    pub fn new(
        id: RaceId,
        token: RaceToken,
        distance: u32,
        created_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Race {
            id,
            token,
            distance,
            status: RaceStatus::Waiting,
            created_by,
            created_at: clock.now(),
            countdown_at: None,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.status == RaceStatus::Waiting
    }

    pub fn is_active(&self) -> bool {
        self.status == RaceStatus::Active
    }

    pub fn is_finished(&self) -> bool {
        self.status == RaceStatus::Finished
    }

    /// True when the race is counting down and the deadline has passed
    pub fn countdown_elapsed(&self, now: DateTime<Utc>) -> bool {
        match (self.status, self.countdown_at) {
            (RaceStatus::Countdown, Some(deadline)) => now >= deadline,
            _ => false,
        }
    }

    /// Pure transition function - returns the new race and the events it produced
    pub fn transition(
        &self,
        event: RaceEvent,
        clock: &impl Clock,
    ) -> Result<(Race, Vec<Event>), TransitionError> {
        let to = event.target();
        if !self.status.can_transition_to(to) {
            return Err(TransitionError::Illegal {
                race_id: self.id,
                from: self.status,
                to,
            });
        }

        let now = clock.now();
        match event {
            // Waiting → Countdown
            RaceEvent::ScheduleCountdown { duration } => {
                let step = chrono::Duration::from_std(duration)
                    .map_err(|_| TransitionError::CountdownOutOfRange(duration))?;
                let deadline = now + step;
                let race = Race {
                    status: RaceStatus::Countdown,
                    countdown_at: Some(deadline),
                    ..self.clone()
                };
                let events = vec![Event::CountdownScheduled {
                    race_id: self.id,
                    deadline,
                }];
                Ok((race, events))
            }

            // Countdown → Active
            RaceEvent::Start => {
                let race = Race {
                    status: RaceStatus::Active,
                    started_at: Some(now),
                    ..self.clone()
                };
                let events = vec![Event::RaceStarted {
                    race_id: self.id,
                    started_at: now,
                }];
                Ok((race, events))
            }

            // Active → Finished
            RaceEvent::Finish => {
                let race = Race {
                    status: RaceStatus::Finished,
                    finished_at: Some(now),
                    ..self.clone()
                };
                let events = vec![Event::RaceFinished {
                    race_id: self.id,
                    finished_at: now,
                }];
                Ok((race, events))
            }
        }
    }
}

#[cfg(test)]
#[path = "race_tests.rs"]
mod tests;
