use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};
use uuid::Uuid;

use sheetchat_crypto::{RoomKey, derive_key, seal};
use sheetchat_store::RowStore;
use sheetchat_types::protocol::MAX_MESSAGE_CHARS;
use sheetchat_types::{Message, MessageKind, Row};

use crate::error::SessionError;
use crate::spin::slot_line;
use crate::sync::SyncState;

/// What a user supplies to join a room.
#[derive(Clone)]
pub struct SessionConfig {
    pub author: String,
    pub seed: String,
}

/// A connected chat session.
///
/// Owns the room key and the local view of the log. Exists only between a
/// successful [`Session::connect`] and [`Session::disconnect`].
pub struct Session {
    author: String,
    key: RoomKey,
    store: Arc<dyn RowStore>,
    state: Mutex<SyncState>,
}

impl Session {
    /// Derive the room key, read the existing log and return the session
    /// with the history it already contained.
    ///
    /// The initial read doubles as the access check: a session is never
    /// handed out for a store we cannot read.
    pub async fn connect(
        config: SessionConfig,
        store: Arc<dyn RowStore>,
    ) -> Result<(Self, Vec<Message>), SessionError> {
        let author = config.author.trim().to_string();
        if author.is_empty() {
            return Err(SessionError::MissingField("author"));
        }
        if config.seed.is_empty() {
            return Err(SessionError::MissingField("seed"));
        }

        // 100k PBKDF2 rounds; keep them off the async workers
        let seed = config.seed;
        let key = tokio::task::spawn_blocking(move || derive_key(&seed))
            .await
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?
            .map_err(|e| SessionError::KeyDerivation(e.to_string()))?;

        let session = Self {
            author,
            key,
            store,
            state: Mutex::new(SyncState::new()),
        };

        let history = session.poll().await?;
        info!(
            "Connected as {} ({} messages in history)",
            session.author,
            history.len()
        );

        Ok((session, history))
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn last_seen_count(&self) -> usize {
        self.lock_state().last_seen_count()
    }

    pub fn seen_count(&self) -> usize {
        self.lock_state().seen_count()
    }

    /// Encrypt and append a message. On success the message is returned for
    /// immediate local display and will not be surfaced again by `poll`.
    pub async fn send(&self, text: &str, kind: MessageKind) -> Result<Message, SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let len = text.encode_utf16().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(SessionError::MessageTooLong {
                len,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let message = Message {
            author: self.author.clone(),
            text: text.to_string(),
            ts: chrono::Utc::now().timestamp_millis(),
            kind,
        };

        let ciphertext =
            seal(&self.key, &message).map_err(|e| SessionError::Encryption(e.to_string()))?;

        // Register the id before the row exists so a concurrent poll that
        // sees the new row cannot surface it a second time.
        let row_id = Uuid::new_v4().to_string();
        self.lock_state().mark_seen(row_id.clone());

        let row = Row::v1(row_id.clone(), message.ts.to_string(), ciphertext);
        if let Err(e) = self.store.append_row(row).await {
            warn!("Append of row {} failed: {}", row_id, e);
            self.lock_state().forget(&row_id);
            return Err(e.into());
        }

        debug!("Appended row {}", row_id);
        Ok(message)
    }

    /// Send a slot-machine spin.
    pub async fn spin(&self) -> Result<Message, SessionError> {
        let line = slot_line(&mut rand::rng());
        self.send(&line, MessageKind::Spin).await
    }

    /// Fetch the log and return messages not seen before, in log order.
    pub async fn poll(&self) -> Result<Vec<Message>, SessionError> {
        let ticket = self.lock_state().begin_fetch();
        let rows = self.store.list_rows().await?;

        let outcome = self.lock_state().ingest(ticket, &rows, &self.key);
        if outcome.new_rows > 0 {
            debug!(
                "Poll: {} new rows, {} messages, {} skipped",
                outcome.new_rows,
                outcome.messages.len(),
                outcome.skipped
            );
        }

        Ok(outcome.messages)
    }

    /// End the session. The room key is wiped when `self` drops.
    pub fn disconnect(self) {
        info!("Disconnected {}", self.author);
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        // Every mutation of the sync state completes before the guard drops,
        // so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
