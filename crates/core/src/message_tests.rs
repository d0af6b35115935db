// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn message(msg_type: MessageType, content: &str) -> Message {
    Message {
        msg_id: "abcd1234".into(),
        sender: "A".into(),
        recipient: "Q".into(),
        msg_type,
        content: content.into(),
        ts: 1_700_000_000.5,
        metadata: HashMap::new(),
    }
}

#[test]
fn serializes_type_field_name() {
    let msg = message(MessageType::Direct, "hello");
    let json = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["type"], "direct");
    assert_eq!(json["msg_id"], "abcd1234");
    assert_eq!(json["ts"], 1_700_000_000.5);
}

#[test]
fn wire_round_trip_preserves_fields() {
    let mut msg = message(MessageType::ShutdownRequest, "please stop");
    msg.metadata
        .insert("reason".into(), serde_json::json!("watchdog"));

    let json = serde_json::to_string(&msg).unwrap();
    let back: Message = serde_json::from_str(&json).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn missing_metadata_defaults_empty() {
    let json = r#"{
        "msg_id": "00000001",
        "sender": "a",
        "recipient": "b",
        "type": "broadcast",
        "content": "ping",
        "ts": 1.0
    }"#;
    let msg: Message = serde_json::from_str(json).unwrap();
    assert_eq!(msg.msg_type, MessageType::Broadcast);
    assert!(msg.metadata.is_empty());
}

#[test]
fn completion_signal_requires_status_update() {
    let done = message(
        MessageType::StatusUpdate,
        "__AGENT_COMPLETED__: initial_task",
    );
    assert!(done.is_completion_signal());

    let wrong_type = message(MessageType::Direct, "__AGENT_COMPLETED__");
    assert!(!wrong_type.is_completion_signal());

    let plain = message(MessageType::StatusUpdate, "still working");
    assert!(!plain.is_completion_signal());
}

#[test]
fn message_type_display_matches_wire_names() {
    for (mt, s) in [
        (MessageType::Direct, "direct"),
        (MessageType::StatusUpdate, "status_update"),
        (MessageType::ShutdownResponse, "shutdown_response"),
        (MessageType::PermissionRequest, "permission_request"),
    ] {
        assert_eq!(mt.to_string(), s);
        assert_eq!(serde_json::to_value(mt).unwrap(), s);
    }
}
