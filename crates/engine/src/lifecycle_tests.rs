// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::{active_race, engine, race_with, ready_all};
use crate::ErrorKind;
use erg_core::ParticipantStatus;
use erg_storage::StoreCall;
use std::time::Duration;
use yare::parameterized;

#[tokio::test]
async fn create_race_registers_creator_not_ready() {
    let engine = engine();
    let race = engine.create_race(UserId(1), 2000).await.unwrap();

    assert_eq!(race.status, RaceStatus::Waiting);
    assert_eq!(race.distance, 2000);
    assert_eq!(race.token, RaceToken::from("race-1"));

    let snapshot = engine.get_race(&race.token).await.unwrap();
    assert_eq!(snapshot.participants.len(), 1);
    assert_eq!(snapshot.participants[0].user_id, UserId(1));
    assert_eq!(snapshot.participants[0].status, ParticipantStatus::NotReady);
}

#[parameterized(
    below_minimum = { 99 },
    zero = { 0 },
    negative = { -2000 },
)]
fn create_race_rejects_short_distance(distance: i64) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    rt.block_on(async {
        let engine = engine();
        let err = engine.create_race(UserId(1), distance).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(engine.store().calls().is_empty());
    });
}

#[tokio::test]
async fn create_race_accepts_minimum_distance() {
    let engine = engine();
    assert!(engine.create_race(UserId(1), 100).await.is_ok());
}

#[tokio::test]
async fn join_race_is_idempotent() {
    let engine = engine();
    let race = race_with(&engine, 2000, &[1]).await;

    engine.join_race(&race.token, UserId(2)).await.unwrap();
    engine.join_race(&race.token, UserId(2)).await.unwrap();
    // Creator re-joining is a no-op too
    engine.join_race(&race.token, UserId(1)).await.unwrap();

    let snapshot = engine.get_race(&race.token).await.unwrap();
    assert_eq!(snapshot.participants.len(), 2);
    assert_eq!(
        engine
            .store()
            .count(|c| matches!(c, StoreCall::InsertParticipant { .. })),
        1
    );
}

#[tokio::test]
async fn join_unknown_token_is_not_found() {
    let engine = engine();
    let err = engine
        .join_race(&RaceToken::from("missing"), UserId(2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn join_after_countdown_is_rejected_without_mutation() {
    let engine = engine();
    let race = race_with(&engine, 2000, &[1, 2]).await;
    ready_all(&engine, race.id, &[1, 2]).await;
    engine.evaluate_countdown(race.id).await.unwrap();
    let before = engine.store().calls().len();

    let err = engine.join_race(&race.token, UserId(3)).await.unwrap_err();
    assert!(matches!(err, RaceError::RaceAlreadyStarted { .. }));
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(engine.store().calls().len(), before);
    assert_eq!(engine.get_race(&race.token).await.unwrap().participants.len(), 2);
}

#[tokio::test]
async fn transition_to_active_requires_countdown() {
    let engine = engine();
    let race = race_with(&engine, 2000, &[1, 2]).await;

    let err = engine.transition_to_active(race.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[tokio::test]
async fn transition_to_active_starts_ready_participants() {
    let engine = engine();
    let race = active_race(&engine, 2000, &[1, 2]).await;

    assert_eq!(race.status, RaceStatus::Active);
    assert_eq!(race.started_at, Some(engine.clock().now()));
    let snapshot = engine.get_race_by_id(race.id).await.unwrap();
    assert!(snapshot
        .participants
        .iter()
        .all(|p| p.status == ParticipantStatus::Racing));
}

#[tokio::test]
async fn transition_to_active_is_noop_once_started() {
    let engine = engine();
    let race = active_race(&engine, 2000, &[1, 2]).await;
    let started_at = race.started_at;
    engine.clock().advance(Duration::from_secs(5));

    engine.transition_to_active(race.id).await.unwrap();

    let again = engine.get_race_by_id(race.id).await.unwrap().race;
    assert_eq!(again.started_at, started_at);
    let starts = engine.store().count(|c| {
        matches!(
            c,
            StoreCall::UpdateRace {
                to: RaceStatus::Active,
                ..
            }
        )
    });
    assert_eq!(starts, 1);
}

#[tokio::test]
async fn start_due_races_waits_for_deadline() {
    let engine = engine();
    let race = race_with(&engine, 2000, &[1, 2]).await;
    ready_all(&engine, race.id, &[1, 2]).await;
    engine.evaluate_countdown(race.id).await.unwrap();

    engine.clock().advance(Duration::from_secs(9));
    assert!(engine.start_due_races().await.unwrap().is_empty());

    engine.clock().advance(Duration::from_secs(1));
    assert_eq!(engine.start_due_races().await.unwrap(), vec![race.id]);
    assert!(engine.get_race_by_id(race.id).await.unwrap().race.is_active());

    // Nothing left counting down
    assert!(engine.start_due_races().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_race_by_unknown_id_is_not_found() {
    let engine = engine();
    let err = engine.get_race_by_id(RaceId(42)).await.unwrap_err();
    assert!(matches!(err, RaceError::RaceNotFound(RaceId(42))));
}

#[tokio::test]
async fn race_history_is_newest_first_with_ranked_roster() {
    let engine = engine();
    let older = active_race(&engine, 100, &[1, 2]).await;
    engine.report_progress(older.id, UserId(2), 100).await.unwrap();
    engine.clock().advance(Duration::from_secs(1));
    engine.report_progress(older.id, UserId(1), 100).await.unwrap();

    engine.clock().advance(Duration::from_secs(60));
    let newer = race_with(&engine, 500, &[3, 1]).await;
    race_with(&engine, 500, &[4]).await;

    let history = engine.race_history(UserId(1)).await.unwrap();
    let ids: Vec<RaceId> = history.iter().map(|h| h.race.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    let finished = &history[1];
    assert_eq!(finished.entry.user_id, UserId(1));
    assert_eq!(finished.entry.position, Some(2));
    let roster: Vec<UserId> = finished.participants.iter().map(|p| p.user_id).collect();
    assert_eq!(roster, vec![UserId(2), UserId(1)]);

    // Unranked races keep join order
    let waiting: Vec<UserId> = history[0].participants.iter().map(|p| p.user_id).collect();
    assert_eq!(waiting, vec![UserId(3), UserId(1)]);
}

#[tokio::test]
async fn progress_log_lists_reports_in_order() {
    let engine = engine();
    let race = active_race(&engine, 2000, &[1, 2]).await;
    engine.report_progress(race.id, UserId(1), 300).await.unwrap();
    engine.report_progress(race.id, UserId(2), 250).await.unwrap();
    engine.report_progress(race.id, UserId(1), 600).await.unwrap();

    let log: Vec<(UserId, u32)> = engine
        .progress_log(race.id)
        .await
        .unwrap()
        .iter()
        .map(|u| (u.user_id, u.distance))
        .collect();
    assert_eq!(
        log,
        vec![(UserId(1), 300), (UserId(2), 250), (UserId(1), 600)]
    );

    let err = engine.progress_log(RaceId(99)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn storage_failure_surfaces_as_storage_kind() {
    let engine = engine();
    let race = race_with(&engine, 2000, &[1]).await;
    engine.store().set_fail_writes(true);

    let err = engine.join_race(&race.token, UserId(2)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StorageFailure);
    assert!(!err.public_message().contains("injected"));
}
