// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result calculator
//!
//! Pure post-race computation of finishing position and pace. Runs once,
//! over the whole finished field, after the last participant crosses the line.

use crate::participant::Participant;
use crate::race::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Distance one pace split covers, in meters
pub const PACE_SPLIT_METERS: u64 = 500;

/// Time per 500 m split, stored at millisecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pace(pub u64);

impl Pace {
    /// Pace for covering `distance` meters in `elapsed_ms`
    ///
    /// Integer arithmetic floors the split; `distance` must be non-zero.
    pub fn from_elapsed(elapsed_ms: u64, distance: u32) -> Pace {
        let split = u128::from(elapsed_ms) * u128::from(PACE_SPLIT_METERS)
            / u128::from(distance.max(1));
        Pace(u64::try_from(split).unwrap_or(u64::MAX))
    }

    pub fn split_millis(&self) -> u64 {
        self.0
    }

    /// Whole minutes of the split
    pub fn minutes(&self) -> u64 {
        self.0 / 60_000
    }

    /// Whole seconds past the minute
    pub fn seconds(&self) -> u64 {
        (self.0 / 1_000) % 60
    }
}

/// Renders as `MM:SS`, both components floored and zero-padded
impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes(), self.seconds())
    }
}

/// Malformed calculator input; always a programming error upstream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    #[error("race has no start time")]
    MissingStartTime,
    #[error("race distance is zero")]
    ZeroDistance,
    #[error("participant {0} has no finish time")]
    MissingFinishTime(UserId),
    #[error("participant {0} finished before the race started")]
    FinishBeforeStart(UserId),
}

/// A finished participant as seen by the calculator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finisher {
    pub user_id: UserId,
    pub finished_at: Option<DateTime<Utc>>,
    /// Arrival rank of the finishing update, breaks finish-time ties
    pub finish_order: u32,
}

impl From<&Participant> for Finisher {
    fn from(p: &Participant) -> Self {
        Finisher {
            user_id: p.user_id,
            finished_at: p.finished_at,
            finish_order: p.finish_order.unwrap_or(u32::MAX),
        }
    }
}

/// Computed result for one finisher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub user_id: UserId,
    /// 1-based finishing rank
    pub position: u32,
    pub pace: Pace,
    pub elapsed_ms: u64,
}

/// Rank finishers and compute their pace
///
/// Position orders by finish time, then by arrival order of the finishing
/// update. Output is sorted by position.
pub fn compute_standings(
    started_at: Option<DateTime<Utc>>,
    distance: u32,
    finishers: &[Finisher],
) -> Result<Vec<Standing>, ResultError> {
    let started_at = started_at.ok_or(ResultError::MissingStartTime)?;
    if distance == 0 {
        return Err(ResultError::ZeroDistance);
    }

    let mut timed = Vec::with_capacity(finishers.len());
    for finisher in finishers {
        let finished_at = finisher
            .finished_at
            .ok_or(ResultError::MissingFinishTime(finisher.user_id))?;
        let elapsed = (finished_at - started_at).num_milliseconds();
        let elapsed_ms =
            u64::try_from(elapsed).map_err(|_| ResultError::FinishBeforeStart(finisher.user_id))?;
        timed.push((finished_at, finisher.finish_order, finisher.user_id, elapsed_ms));
    }

    timed.sort_by_key(|(finished_at, order, _, _)| (*finished_at, *order));

    Ok(timed
        .into_iter()
        .zip(1u32..)
        .map(|((_, _, user_id, elapsed_ms), position)| Standing {
            user_id,
            position,
            pace: Pace::from_elapsed(elapsed_ms, distance),
            elapsed_ms,
        })
        .collect())
}

#[cfg(test)]
#[path = "results_tests.rs"]
mod tests;
