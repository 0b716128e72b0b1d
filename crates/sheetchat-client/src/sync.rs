use std::collections::HashSet;

use tracing::{debug, warn};

use sheetchat_crypto::{RoomKey, open};
use sheetchat_types::{Message, Row};

/// Local view of the remote log: how many rows have been processed, and
/// which row ids have already been surfaced.
#[derive(Debug, Default)]
pub struct SyncState {
    last_seen_count: usize,
    seen_ids: HashSet<String>,
    next_ticket: u64,
    applied: Option<FetchTicket>,
}

/// Issued when a fetch starts; snapshots are applied in ticket order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub messages: Vec<Message>,
    /// Rows past the previous high-water mark.
    pub new_rows: usize,
    /// New rows dropped for a wrong version or a failed decrypt.
    pub skipped: usize,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen_count(&self) -> usize {
        self.last_seen_count
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen_ids.contains(id)
    }

    /// Returns false if the id was already recorded.
    pub fn mark_seen(&mut self, id: String) -> bool {
        self.seen_ids.insert(id)
    }

    pub fn forget(&mut self, id: &str) {
        self.seen_ids.remove(id);
    }

    /// Take a ticket before fetching a snapshot, and hand it back to `ingest`.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Process a full snapshot of the log. Only rows past `last_seen_count`
    /// are looked at; the counter then moves to the snapshot length whether
    /// or not each row decrypted.
    ///
    /// A snapshot whose fetch started before an already applied one is
    /// dropped: it can only be missing rows, not hold new ones.
    pub fn ingest(&mut self, ticket: FetchTicket, rows: &[Row], key: &RoomKey) -> SyncOutcome {
        if self.applied.is_some_and(|applied| ticket < applied) {
            debug!(
                "Dropping stale snapshot #{} of {} rows (#{} already applied)",
                ticket.0,
                rows.len(),
                self.applied.map_or(0, |a| a.0)
            );
            return SyncOutcome::default();
        }
        self.applied = Some(ticket);

        let total = rows.len();

        if total < self.last_seen_count {
            warn!(
                "Row count went from {} to {}; rows were removed from the store",
                self.last_seen_count, total
            );
            self.last_seen_count = total;
            return SyncOutcome::default();
        }

        let mut outcome = SyncOutcome {
            new_rows: total - self.last_seen_count,
            ..SyncOutcome::default()
        };

        for row in &rows[self.last_seen_count..] {
            if !row.is_supported_version() {
                debug!("Skipping row {} with version '{}'", row.id, row.version);
                outcome.skipped += 1;
                continue;
            }
            if self.seen_ids.contains(&row.id) {
                continue;
            }

            match open(key, &row.ciphertext) {
                Some(message) => {
                    self.seen_ids.insert(row.id.clone());
                    outcome.messages.push(message);
                }
                None => {
                    debug!("Skipping row {}: envelope did not open", row.id);
                    outcome.skipped += 1;
                }
            }
        }

        self.last_seen_count = total;
        outcome
    }
}
