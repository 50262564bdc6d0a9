// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol unit tests

use super::*;

#[test]
fn encode_decode_report_progress() {
    let request = Request::ReportProgress {
        race_id: RaceId(3),
        user_id: UserId(7),
        distance: 1250,
    };

    let encoded = encode(&request).expect("encode failed");
    let decoded: Request = decode(&encoded).expect("decode failed");

    assert_eq!(request, decoded);
}

#[test]
fn query_is_nested_under_its_own_tag() {
    let request = Request::Query {
        query: Query::GetRace {
            token: RaceToken::from("abc"),
        },
    };

    let value: serde_json::Value =
        serde_json::from_slice(&encode(&request).expect("encode failed")).expect("valid json");
    assert_eq!(value["type"], "Query");
    assert_eq!(value["query"]["type"], "GetRace");
    assert_eq!(value["query"]["token"], "abc");
}

#[test]
fn error_response_carries_snake_case_kind() {
    let response = Response::Error {
        kind: ErrorKind::InvalidState,
        message: "race 4 is active; cannot join".to_string(),
    };

    let encoded = encode(&response).expect("encode failed");
    let value: serde_json::Value = serde_json::from_slice(&encoded).expect("valid json");
    assert_eq!(value["kind"], "invalid_state");

    let decoded: Response = decode(&encoded).expect("decode failed");
    assert_eq!(response, decoded);
}

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Ok;
    let encoded = encode(&response).expect("encode failed");

    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert_eq!(json_str, r#"{"type":"Ok"}"#);
}

#[test]
fn decode_rejects_unknown_request() {
    let result: Result<Request, _> = decode(br#"{"type":"DropTables"}"#);
    assert!(matches!(result, Err(ProtocolError::Json(_))));
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original)
        .await
        .expect("write failed");

    // 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, original);
}

#[tokio::test]
async fn read_from_empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_prefix_is_rejected_before_allocating() {
    let mut buffer = u32::MAX.to_be_bytes().to_vec();
    buffer.extend_from_slice(b"{}");
    let mut cursor = std::io::Cursor::new(buffer);

    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MessageTooLarge { .. }));
}

#[tokio::test]
async fn read_request_times_out_on_silent_peer() {
    let (_client, server) = tokio::io::duplex(64);
    let mut server = server;

    let err = read_request(&mut server, Duration::from_millis(20))
        .await
        .unwrap_err();
    assert!(matches!(err, ProtocolError::Timeout));
}
