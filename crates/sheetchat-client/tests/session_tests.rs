use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::sync::mpsc;

use sheetchat_client::{ChatEvent, ErrorKind, Session, SessionConfig, SessionError, run_poll_loop};
use sheetchat_crypto::{RoomKey, derive_key, seal};
use sheetchat_store::{MemoryStore, RowStore, StoreError};
use sheetchat_types::protocol::SPIN_SYMBOLS;
use sheetchat_types::{Message, MessageKind, Row};

const SEED: &str = "room-42";

fn room_key() -> &'static RoomKey {
    static KEY: OnceLock<RoomKey> = OnceLock::new();
    KEY.get_or_init(|| derive_key(SEED).unwrap())
}

fn config(author: &str) -> SessionConfig {
    SessionConfig {
        author: author.into(),
        seed: SEED.into(),
    }
}

/// A row as another client in the same room would write it.
fn foreign_row(id: &str, author: &str, text: &str) -> Row {
    let msg = Message {
        author: author.into(),
        text: text.into(),
        ts: 1_700_000_000_000,
        kind: MessageKind::Text,
    };
    Row::v1(id, msg.ts.to_string(), seal(room_key(), &msg).unwrap())
}

async fn connect(store: &Arc<MemoryStore>) -> (Session, Vec<Message>) {
    let dyn_store: Arc<dyn RowStore> = store.clone();
    Session::connect(config("alice"), dyn_store).await.unwrap()
}

#[tokio::test]
async fn connect_returns_history() {
    let mut legacy = foreign_row("r3", "bob", "from the future");
    legacy.version = "v2".into();
    let store = Arc::new(MemoryStore::with_rows(vec![
        foreign_row("r1", "bob", "hi"),
        foreign_row("r2", "carol", "hello"),
        legacy,
        Row::v1("r4", "0", "corrupted"),
    ]));

    let (session, history) = connect(&store).await;
    let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["hi", "hello"]);
    assert_eq!(session.last_seen_count(), 4);
    assert_eq!(session.seen_count(), 2);
    assert_eq!(session.author(), "alice");
}

#[tokio::test]
async fn one_new_row_one_new_message() {
    let store = Arc::new(MemoryStore::with_rows(vec![
        foreign_row("r1", "bob", "one"),
        foreign_row("r2", "bob", "two"),
        foreign_row("r3", "bob", "three"),
    ]));
    let (session, _) = connect(&store).await;
    let before = session.last_seen_count();

    store.push(foreign_row("r4", "bob", "four"));
    let fresh = session.poll().await.unwrap();

    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].text, "four");
    assert_eq!(session.last_seen_count(), before + 1);
}

#[tokio::test]
async fn repoll_is_idempotent() {
    let store = Arc::new(MemoryStore::with_rows(vec![foreign_row("r1", "bob", "one")]));
    let (session, _) = connect(&store).await;

    store.push(foreign_row("r2", "bob", "two"));
    assert_eq!(session.poll().await.unwrap().len(), 1);
    assert!(session.poll().await.unwrap().is_empty());
    assert!(session.poll().await.unwrap().is_empty());
    assert_eq!(session.last_seen_count(), 2);
}

#[tokio::test]
async fn overlapping_polls_surface_once() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    store.push(foreign_row("r1", "bob", "once"));
    let (a, b) = tokio::join!(session.poll(), session.poll());
    assert_eq!(a.unwrap().len() + b.unwrap().len(), 1);
    assert_eq!(session.last_seen_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_polls_across_threads_surface_once() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;
    let session = Arc::new(session);

    for i in 0..5 {
        store.push(foreign_row(&format!("r{i}"), "bob", "hi"));
    }

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let session = session.clone();
            tokio::spawn(async move { session.poll().await.unwrap().len() })
        })
        .collect();

    let mut total = 0;
    for task in tasks {
        total += task.await.unwrap();
    }
    assert_eq!(total, 5);
    assert_eq!(session.last_seen_count(), 5);
    assert_eq!(session.seen_count(), 5);
}

#[tokio::test]
async fn foreign_version_never_rendered() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    for version in ["v2", "V1", "", "v1 "] {
        let mut row = foreign_row(&format!("x-{}", version), "mallory", "valid ciphertext");
        row.version = version.into();
        store.push(row);
    }

    assert!(session.poll().await.unwrap().is_empty());
    assert_eq!(session.last_seen_count(), 4);
    assert_eq!(session.seen_count(), 0);
}

#[tokio::test]
async fn other_rooms_are_unreadable() {
    let other_key = derive_key("some other room").unwrap();
    let msg = Message {
        author: "eve".into(),
        text: "psst".into(),
        ts: 1,
        kind: MessageKind::Text,
    };
    let store = Arc::new(MemoryStore::with_rows(vec![
        Row::v1("e1", "1", seal(&other_key, &msg).unwrap()),
        foreign_row("r1", "bob", "visible"),
    ]));

    let (_, history) = connect(&store).await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].text, "visible");
}

#[tokio::test]
async fn overlong_message_never_hits_the_store() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    let err = session.send(&"x".repeat(1001), MessageKind::Text).await.unwrap_err();
    assert!(matches!(err, SessionError::MessageTooLong { len: 1001, max: 1000 }));
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(store.append_calls(), 0);

    let err = session.send("", MessageKind::Text).await.unwrap_err();
    assert!(matches!(err, SessionError::EmptyMessage));
    assert_eq!(store.append_calls(), 0);
}

#[tokio::test]
async fn limit_counts_utf16_units_not_bytes() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    // 1000 UTF-16 units, 3000 bytes
    let text = "€".repeat(1000);
    let sent = session.send(&text, MessageKind::Text).await.unwrap();
    assert_eq!(sent.text, text);
    assert_eq!(store.append_calls(), 1);

    // Astral-plane characters take two units each
    let text = "😀".repeat(500);
    session.send(&text, MessageKind::Text).await.unwrap();
    assert_eq!(store.append_calls(), 2);
}

#[tokio::test]
async fn astral_characters_count_twice_toward_limit() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    // 600 characters, 1200 UTF-16 units
    let err = session
        .send(&"😀".repeat(600), MessageKind::Text)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::MessageTooLong { len: 1200, max: 1000 }
    ));
    assert_eq!(err.kind(), ErrorKind::Input);
    assert_eq!(store.append_calls(), 0);
}

#[tokio::test]
async fn sent_message_is_not_echoed_by_poll() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    let sent = session.send("hello room", MessageKind::Text).await.unwrap();
    assert_eq!(sent.author, "alice");
    assert_eq!(sent.kind, MessageKind::Text);

    let rows = store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].version, "v1");
    assert_eq!(rows[0].ts, sent.ts.to_string());
    assert!(uuid::Uuid::parse_str(&rows[0].id).is_ok());

    assert!(session.poll().await.unwrap().is_empty());
    assert_eq!(session.last_seen_count(), 1);
}

#[tokio::test]
async fn sent_row_opens_for_other_members() {
    let store = Arc::new(MemoryStore::new());
    let (alice, _) = connect(&store).await;
    let dyn_store: Arc<dyn RowStore> = store.clone();
    let (bob, _) = Session::connect(config("bob"), dyn_store).await.unwrap();

    alice.send("ping", MessageKind::Text).await.unwrap();

    let seen_by_bob = bob.poll().await.unwrap();
    assert_eq!(seen_by_bob.len(), 1);
    assert_eq!(seen_by_bob[0].author, "alice");
    assert_eq!(seen_by_bob[0].text, "ping");
}

#[tokio::test]
async fn failed_poll_is_transient() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    store.push(foreign_row("r1", "bob", "while you were away"));
    store.fail_reads(1);

    let err = session.poll().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(session.last_seen_count(), 0);

    let fresh = session.poll().await.unwrap();
    assert_eq!(fresh.len(), 1);
    assert_eq!(session.last_seen_count(), 1);
}

#[tokio::test]
async fn failed_append_forgets_the_id() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;
    store.fail_appends(1);

    let err = session.send("lost", MessageKind::Text).await.unwrap_err();
    assert!(matches!(err, SessionError::Store(StoreError::Unavailable(_))));
    assert_eq!(err.kind(), ErrorKind::Transient);
    assert_eq!(session.seen_count(), 0);
    assert!(store.rows().is_empty());
}

#[tokio::test]
async fn connect_validates_before_any_io() {
    let store = Arc::new(MemoryStore::new());

    let dyn_store: Arc<dyn RowStore> = store.clone();
    let err = Session::connect(config("   "), dyn_store).await.err().unwrap();
    assert!(matches!(err, SessionError::MissingField("author")));

    let dyn_store: Arc<dyn RowStore> = store.clone();
    let empty_seed = SessionConfig {
        author: "alice".into(),
        seed: String::new(),
    };
    let err = Session::connect(empty_seed, dyn_store).await.err().unwrap();
    assert!(matches!(err, SessionError::MissingField("seed")));
    assert_eq!(err.kind(), ErrorKind::Input);

    assert_eq!(store.list_calls(), 0);
}

#[tokio::test]
async fn connect_fails_without_store_access() {
    let store = Arc::new(MemoryStore::new());
    store.fail_reads(1);

    let dyn_store: Arc<dyn RowStore> = store.clone();
    let err = Session::connect(config("alice"), dyn_store).await.err().unwrap();
    assert!(matches!(err, SessionError::Store(_)));
}

#[tokio::test]
async fn spin_sends_three_reels() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;

    let sent = session.spin().await.unwrap();
    assert_eq!(sent.kind, MessageKind::Spin);
    let reels: Vec<&str> = sent
        .text
        .trim_matches(|c| c == '|' || c == ' ')
        .split(" | ")
        .collect();
    assert_eq!(reels.len(), 3);
    assert!(reels.iter().all(|r| SPIN_SYMBOLS.contains(r)));
}

#[tokio::test]
async fn poll_loop_forwards_and_survives_errors() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;
    let session = Arc::new(session);

    let (tx, mut rx) = mpsc::channel(16);
    let handle = tokio::spawn(run_poll_loop(session.clone(), Duration::from_millis(10), tx));

    store.fail_reads(1);
    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(first, ChatEvent::PollFailed(_)));

    store.push(foreign_row("r1", "bob", "still here"));
    let next = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    match next {
        ChatEvent::Message(m) => assert_eq!(m.text, "still here"),
        other => panic!("expected a message, got {:?}", other),
    }

    drop(rx);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn disconnect_consumes_session() {
    let store = Arc::new(MemoryStore::new());
    let (session, _) = connect(&store).await;
    session.disconnect();
    assert_eq!(store.list_calls(), 1);
}
