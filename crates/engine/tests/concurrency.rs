// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exactly-once guarantees under concurrent callers
//!
//! Each test fires many tasks at the same race on a multi-threaded runtime
//! and checks that the guarded transition happened once.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use erg_core::{
    Clock, FakeClock, ParticipantStatus, RaceConfig, RaceId, RaceStatus, SequentialIdGen, UserId,
};
use erg_engine::RaceEngine;
use erg_storage::{FakeStore, StoreCall};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

type Engine = RaceEngine<FakeStore, FakeClock, SequentialIdGen>;

fn shared_engine() -> Arc<Engine> {
    Arc::new(RaceEngine::new(
        FakeStore::new(),
        FakeClock::new(),
        SequentialIdGen::default(),
        RaceConfig::default(),
    ))
}

async fn ready_race(engine: &Engine, users: u64) -> RaceId {
    let race = engine.create_race(UserId(1), 2000).await.unwrap();
    for user in 2..=users {
        engine.join_race(&race.token, UserId(user)).await.unwrap();
    }
    for user in 1..=users {
        engine.set_ready(race.id, UserId(user), true).await.unwrap();
    }
    race.id
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_evaluations_schedule_one_countdown() {
    let engine = shared_engine();
    let race_id = ready_race(&engine, 4).await;

    let mut tasks = JoinSet::new();
    for _ in 0..32 {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move { engine.evaluate_countdown(race_id).await.unwrap() });
    }

    let mut winners = 0;
    while let Some(result) = tasks.join_next().await {
        if result.unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
    let applied = engine.store().count(|c| {
        matches!(
            c,
            StoreCall::UpdateRace {
                to: RaceStatus::Countdown,
                applied: true,
                ..
            }
        )
    });
    assert_eq!(applied, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_write_start_time_once() {
    let engine = shared_engine();
    let race_id = ready_race(&engine, 3).await;
    assert!(engine.evaluate_countdown(race_id).await.unwrap());
    engine.clock().advance(Duration::from_secs(10));

    let mut tasks = JoinSet::new();
    for i in 0..32 {
        let engine = Arc::clone(&engine);
        if i % 2 == 0 {
            tasks.spawn(async move { engine.transition_to_active(race_id).await.unwrap() });
        } else {
            tasks.spawn(async move {
                engine.start_due_races().await.unwrap();
            });
        }
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let snapshot = engine.get_race_by_id(race_id).await.unwrap();
    assert_eq!(snapshot.race.status, RaceStatus::Active);
    assert_eq!(snapshot.race.started_at, Some(engine.clock().now()));
    assert!(snapshot
        .participants
        .iter()
        .all(|p| p.status == ParticipantStatus::Racing));

    let starts = engine.store().count(|c| {
        matches!(
            c,
            StoreCall::UpdateRace {
                to: RaceStatus::Active,
                applied: true,
                ..
            }
        )
    });
    assert_eq!(starts, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_finishers_publish_results_once() {
    let engine = shared_engine();
    let users = 8;
    let race_id = ready_race(&engine, users).await;
    engine.evaluate_countdown(race_id).await.unwrap();
    engine.clock().advance(Duration::from_secs(10));
    engine.transition_to_active(race_id).await.unwrap();
    engine.clock().advance(Duration::from_secs(420));

    let mut tasks = JoinSet::new();
    for user in 1..=users {
        let engine = Arc::clone(&engine);
        tasks.spawn(async move {
            engine
                .report_progress(race_id, UserId(user), 2000)
                .await
                .unwrap()
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let snapshot = engine.get_race_by_id(race_id).await.unwrap();
    assert_eq!(snapshot.race.status, RaceStatus::Finished);

    let results = engine.store().count(|c| {
        matches!(
            c,
            StoreCall::RecordProgress {
                finishers: Some(_),
                applied: true,
                ..
            }
        )
    });
    assert_eq!(results, 1);

    // Every finish was durably recorded
    assert_eq!(engine.progress_log(race_id).await.unwrap().len(), users as usize);

    let mut positions: Vec<u32> = snapshot
        .participants
        .iter()
        .map(|p| p.position.unwrap())
        .collect();
    positions.sort_unstable();
    assert_eq!(positions, (1..=users as u32).collect::<Vec<_>>());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_insert_each_user_once() {
    let engine = shared_engine();
    let race = engine.create_race(UserId(1), 2000).await.unwrap();

    let mut tasks = JoinSet::new();
    for attempt in 0..40u64 {
        let engine = Arc::clone(&engine);
        let token = race.token.clone();
        tasks.spawn(async move {
            engine
                .join_race(&token, UserId(2 + attempt % 4))
                .await
                .unwrap()
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    let snapshot = engine.get_race(&race.token).await.unwrap();
    assert_eq!(snapshot.participants.len(), 5);
}
