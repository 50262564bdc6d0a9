// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{decode, encode, read_message, write_message};
use erg_core::{FakeClock, RaceConfig, RaceId, RaceToken, SequentialIdGen, UserId};
use erg_storage::JournalStore;

type TestContext = ServerContext<JournalStore, FakeClock, SequentialIdGen>;

fn context() -> TestContext {
    let engine = RaceEngine::new(
        JournalStore::in_memory(),
        FakeClock::new(),
        SequentialIdGen::default(),
        RaceConfig::default(),
    );
    ServerContext::new(engine, Duration::from_secs(1))
}

async fn create(ctx: &TestContext, user: u64) -> (RaceId, RaceToken) {
    match handle_request(
        ctx,
        Request::CreateRace {
            user_id: UserId(user),
            distance: 2000,
        },
    )
    .await
    {
        Response::RaceCreated { race } => (race.id, race.token),
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn ping_and_hello() {
    let ctx = context();
    assert_eq!(handle_request(&ctx, Request::Ping).await, Response::Pong);
    assert_eq!(
        handle_request(
            &ctx,
            Request::Hello {
                version: "0".to_string()
            }
        )
        .await,
        Response::Hello {
            version: PROTOCOL_VERSION.to_string()
        }
    );
}

#[tokio::test]
async fn set_ready_schedules_countdown_once_everyone_is_ready() {
    let ctx = context();
    let (race_id, token) = create(&ctx, 1).await;
    let join = Request::JoinRace {
        token: token.clone(),
        user_id: UserId(2),
    };
    assert_eq!(handle_request(&ctx, join).await, Response::Ok);

    let ready = |user| Request::SetReady {
        race_id,
        user_id: UserId(user),
        ready: true,
    };
    assert_eq!(
        handle_request(&ctx, ready(1)).await,
        Response::Countdown { scheduled: false }
    );
    assert_eq!(
        handle_request(&ctx, ready(2)).await,
        Response::Countdown { scheduled: true }
    );

    match handle_request(&ctx, Request::Query { query: Query::GetRace { token } }).await {
        Response::Race { snapshot } => {
            assert_eq!(snapshot.race.status, RaceStatus::Countdown);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn unready_does_not_evaluate() {
    let ctx = context();
    let (race_id, _) = create(&ctx, 1).await;
    let response = handle_request(
        &ctx,
        Request::SetReady {
            race_id,
            user_id: UserId(1),
            ready: false,
        },
    )
    .await;
    assert_eq!(response, Response::Countdown { scheduled: false });
}

#[tokio::test]
async fn engine_errors_map_to_typed_responses() {
    let ctx = context();
    let response = handle_request(
        &ctx,
        Request::CreateRace {
            user_id: UserId(1),
            distance: 50,
        },
    )
    .await;
    assert!(matches!(
        response,
        Response::Error {
            kind: ErrorKind::InvalidInput,
            ..
        }
    ));

    let response = handle_request(&ctx, Request::StartRace { race_id: RaceId(9) }).await;
    assert!(matches!(
        response,
        Response::Error {
            kind: ErrorKind::NotFound,
            ..
        }
    ));
}

#[tokio::test]
async fn status_counts_races_by_status() {
    let ctx = context();
    create(&ctx, 1).await;
    create(&ctx, 2).await;

    match handle_request(&ctx, Request::Status).await {
        Response::Status {
            races_waiting,
            races_countdown,
            races_active,
            ..
        } => {
            assert_eq!(races_waiting, 2);
            assert_eq!(races_countdown, 0);
            assert_eq!(races_active, 0);
        }
        other => panic!("unexpected response: {:?}", other),
    }
}

#[tokio::test]
async fn shutdown_request_wakes_waiter() {
    let ctx = context();
    assert_eq!(
        handle_request(&ctx, Request::Shutdown).await,
        Response::ShuttingDown
    );
    tokio::time::timeout(Duration::from_secs(1), ctx.shutdown_requested())
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_round_trip_over_duplex_stream() {
    let ctx = context();
    let (client, server) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    let body = encode(&Request::Ping).unwrap();
    write_message(&mut client_write, &body).await.unwrap();

    handle_connection(&ctx, server_read, server_write)
        .await
        .unwrap();

    let reply: Response = decode(&read_message(&mut client_read).await.unwrap()).unwrap();
    assert_eq!(reply, Response::Pong);
}

#[tokio::test]
async fn malformed_request_gets_invalid_input_reply() {
    let ctx = context();
    let (client, server) = tokio::io::duplex(4096);
    let (server_read, server_write) = tokio::io::split(server);
    let (mut client_read, mut client_write) = tokio::io::split(client);

    write_message(&mut client_write, b"{\"type\":\"Nope\"}")
        .await
        .unwrap();
    handle_connection(&ctx, server_read, server_write)
        .await
        .unwrap();

    let reply: Response = decode(&read_message(&mut client_read).await.unwrap()).unwrap();
    assert!(matches!(
        reply,
        Response::Error {
            kind: ErrorKind::InvalidInput,
            ..
        }
    ));
}
