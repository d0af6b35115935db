// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use swarm_core::SequentialIdGen;
use tempfile::TempDir;

fn mailbox(owner: &str, tmp: &TempDir) -> Mailbox {
    Mailbox::with_id_gen(
        owner,
        tmp.path(),
        Arc::new(SequentialIdGen::new(owner.to_lowercase())),
    )
}

#[test]
fn send_lands_one_parseable_file_in_inbox() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);

    let sent = a
        .send("Q", MessageType::Direct, "hello", None)
        .unwrap();
    assert_eq!(sent.sender, "A");
    assert_eq!(sent.recipient, "Q");

    let inbox = tmp.path().join("Q").join("inbox");
    let files: Vec<_> = std::fs::read_dir(&inbox).unwrap().flatten().collect();
    assert_eq!(files.len(), 1);

    let name = files[0].file_name().into_string().unwrap();
    let (epoch, rest) = name.split_once('-').unwrap();
    assert!(epoch.parse::<u64>().is_ok());
    assert_eq!(rest, format!("{}.json", sent.msg_id));

    // Atomic visibility: whatever is observable parses.
    let raw = std::fs::read_to_string(files[0].path()).unwrap();
    let parsed: Message = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed.content, "hello");
    assert_eq!(parsed.msg_type, MessageType::Direct);
}

#[test]
fn send_leaves_no_temp_files() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    for _ in 0..5 {
        a.send("Q", MessageType::Direct, "x", None).unwrap();
    }
    let inbox = tmp.path().join("Q").join("inbox");
    for entry in std::fs::read_dir(inbox).unwrap().flatten() {
        let name = entry.file_name().into_string().unwrap();
        assert!(name.ends_with(".json"), "stray file: {name}");
    }
}

#[test]
fn poll_returns_each_message_exactly_once() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let q = mailbox("Q", &tmp);

    a.send("Q", MessageType::Direct, "one", None).unwrap();
    a.send("Q", MessageType::Direct, "two", None).unwrap();

    let first = q.poll();
    assert_eq!(first.len(), 2);
    assert!(q.poll().is_empty(), "second poll must see nothing");

    // Files moved to processed/, inbox empty.
    let counts = q.counts();
    assert_eq!(counts.unread, 0);
    assert_eq!(counts.processed, 2);
}

#[test]
fn poll_orders_by_filename() {
    let tmp = TempDir::new().unwrap();
    let q = mailbox("Q", &tmp);
    let inbox = tmp.path().join("Q").join("inbox");
    std::fs::create_dir_all(&inbox).unwrap();

    // Hand-write files with controlled names out of creation order.
    for (name, content) in [
        ("1000000000003-cc.json", "third"),
        ("1000000000001-aa.json", "first"),
        ("1000000000002-bb.json", "second"),
    ] {
        let msg = serde_json::json!({
            "msg_id": &name[14..16],
            "sender": "A",
            "recipient": "Q",
            "type": "direct",
            "content": content,
            "ts": 1.0,
        });
        std::fs::write(inbox.join(name), msg.to_string()).unwrap();
    }

    let contents: Vec<_> = q.poll().into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[test]
fn poll_skips_corrupt_files_silently() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let q = mailbox("Q", &tmp);

    a.send("Q", MessageType::Direct, "good", None).unwrap();
    let inbox = tmp.path().join("Q").join("inbox");
    std::fs::write(inbox.join("0000000000000-zz.json"), "{ not json").unwrap();

    let messages = q.poll();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "good");
}

#[test]
fn broadcast_skips_self_and_reaches_everyone_else() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let roster: Vec<String> = ["A", "B", "C", "Q"].iter().map(|s| s.to_string()).collect();

    let (sent, errors) = a.broadcast(&roster, MessageType::Broadcast, "ping", None);
    assert!(errors.is_empty());
    assert_eq!(sent.len(), 3);

    for name in ["B", "C", "Q"] {
        let inbox = mailbox(name, &tmp);
        let got = inbox.poll();
        assert_eq!(got.len(), 1, "{name} should receive exactly one");
        assert_eq!(got[0].msg_type, MessageType::Broadcast);
        assert_eq!(got[0].sender, "A");
    }

    // Sender's own inbox stays empty.
    assert!(!a.has_messages());
}

#[test]
fn has_messages_is_side_effect_free() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let q = mailbox("Q", &tmp);

    assert!(!q.has_messages());
    a.send("Q", MessageType::Direct, "hi", None).unwrap();
    assert!(q.has_messages());
    assert!(q.has_messages(), "check must not consume");
    assert_eq!(q.poll().len(), 1);
}

#[test]
fn heartbeat_round_trip() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let q = mailbox("Q", &tmp);

    assert_eq!(q.read_heartbeat("A"), None);
    a.write_heartbeat();
    let beat = q.read_heartbeat("A").unwrap();
    assert!((swarm_core::epoch_s() - beat).abs() < 5.0);
}

#[test]
fn cleanup_processed_removes_only_old_files() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let q = mailbox("Q", &tmp);

    a.send("Q", MessageType::Direct, "x", None).unwrap();
    q.poll();
    assert_eq!(q.counts().processed, 1);

    // Fresh file survives a strict max-age.
    q.cleanup_processed(3600.0);
    assert_eq!(q.counts().processed, 1);

    // Zero max-age deletes anything with measurable age.
    std::thread::sleep(std::time::Duration::from_millis(20));
    q.cleanup_processed(0.0);
    assert_eq!(q.counts().processed, 0);
}

#[test]
fn all_processed_messages_sorted_by_ts() {
    let tmp = TempDir::new().unwrap();
    let a = mailbox("A", &tmp);
    let b = mailbox("B", &tmp);
    let q = mailbox("Q", &tmp);

    a.send("Q", MessageType::Direct, "first", None).unwrap();
    b.send("A", MessageType::Direct, "second", None).unwrap();
    q.poll();
    a.poll();

    let all = all_processed_messages(tmp.path());
    assert_eq!(all.len(), 2);
    assert!(all[0].ts <= all[1].ts);
}
