use serde::{Deserialize, Serialize};

use crate::protocol::PROTOCOL_VERSION;

/// What a chat message renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    /// Slot-machine result, rendered monospaced
    Spin,
}

/// A plaintext chat message. This is what gets sealed inside an envelope;
/// the store only ever sees the ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: String,
    pub text: String,
    /// Epoch milliseconds, set by the sender.
    pub ts: i64,
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

/// One persisted row of the append-only log.
///
/// Column order on the wire is `[id, ts, ciphertext, version]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: String,
    pub ts: String,
    pub ciphertext: String,
    pub version: String,
}

impl Row {
    /// Build a row for the current protocol version.
    pub fn v1(id: impl Into<String>, ts: impl Into<String>, ciphertext: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ts: ts.into(),
            ciphertext: ciphertext.into(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    /// Rebuild a row from the cells returned by the store. Missing trailing
    /// cells become empty strings; extra cells are ignored.
    pub fn from_cells(cells: Vec<String>) -> Self {
        let mut cells = cells.into_iter();
        let mut next = || cells.next().unwrap_or_default();
        Self {
            id: next(),
            ts: next(),
            ciphertext: next(),
            version: next(),
        }
    }

    pub fn into_cells(self) -> Vec<String> {
        vec![self.id, self.ts, self.ciphertext, self.version]
    }

    pub fn is_supported_version(&self) -> bool {
        self.version == PROTOCOL_VERSION
    }
}
