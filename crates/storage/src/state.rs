// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay

use erg_core::{
    Operation, Participant, ProgressUpdate, Race, RaceId, RaceToken, Standing, UserId,
};
use std::collections::{BTreeMap, HashMap};

/// Materialized state built from WAL operations
#[derive(Debug, Default)]
pub struct MaterializedState {
    pub races: BTreeMap<RaceId, Race>,
    tokens: HashMap<RaceToken, RaceId>,
    /// Participants per race, in join order
    pub participants: HashMap<RaceId, Vec<Participant>>,
    /// Append-only progress audit trail per race
    pub progress: HashMap<RaceId, Vec<ProgressUpdate>>,
    last_race_id: u64,
}

impl MaterializedState {
    /// Rebuild state by applying operations in order
    pub fn from_operations<'a>(ops: impl IntoIterator<Item = &'a Operation>) -> Self {
        let mut state = Self::default();
        for op in ops {
            state.apply(op);
        }
        state
    }

    pub fn race(&self, id: RaceId) -> Option<&Race> {
        self.races.get(&id)
    }

    pub fn race_by_token(&self, token: &RaceToken) -> Option<&Race> {
        self.tokens.get(token).and_then(|id| self.races.get(id))
    }

    pub fn participants(&self, race_id: RaceId) -> &[Participant] {
        self.participants
            .get(&race_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn participant(&self, race_id: RaceId, user_id: UserId) -> Option<&Participant> {
        self.participants(race_id)
            .iter()
            .find(|p| p.user_id == user_id)
    }

    pub fn progress(&self, race_id: RaceId) -> &[ProgressUpdate] {
        self.progress
            .get(&race_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Reserve the next internal race key
    ///
    /// Keys handed out but never committed are simply skipped.
    pub fn next_race_id(&mut self) -> RaceId {
        self.last_race_id += 1;
        RaceId(self.last_race_id)
    }

    /// Apply an operation to update the state
    pub fn apply(&mut self, op: &Operation) {
        match op {
            Operation::RaceCreate { race, creator } => {
                self.last_race_id = self.last_race_id.max(race.id.0);
                self.tokens.insert(race.token.clone(), race.id);
                self.races.insert(race.id, race.clone());
                self.participants.insert(race.id, vec![creator.clone()]);
            }

            Operation::RaceUpdate { race } => {
                if let Some(existing) = self.races.get_mut(&race.id) {
                    *existing = race.clone();
                }
            }

            Operation::ParticipantUpsert { participant } => self.upsert_participant(participant),

            Operation::ProgressRecord {
                update,
                participant,
                finish,
            } => {
                self.progress
                    .entry(update.race_id)
                    .or_default()
                    .push(update.clone());
                self.upsert_participant(participant);
                if let Some(finish) = finish {
                    if let Some(existing) = self.races.get_mut(&finish.race.id) {
                        *existing = finish.race.clone();
                    }
                    self.apply_standings(finish.race.id, &finish.standings);
                }
            }
        }
    }

    fn upsert_participant(&mut self, participant: &Participant) {
        let roster = self.participants.entry(participant.race_id).or_default();
        match roster.iter_mut().find(|p| p.user_id == participant.user_id) {
            Some(existing) => *existing = participant.clone(),
            None => roster.push(participant.clone()),
        }
    }

    fn apply_standings(&mut self, race_id: RaceId, standings: &[Standing]) {
        let Some(roster) = self.participants.get_mut(&race_id) else {
            return;
        };
        for standing in standings {
            if let Some(p) = roster.iter_mut().find(|p| p.user_id == standing.user_id) {
                p.position = Some(standing.position);
                p.pace = Some(standing.pace);
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
