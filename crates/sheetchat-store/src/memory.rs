use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use sheetchat_types::Row;

use crate::{RowStore, StoreError};

/// In-process row log. Backs offline mode and the test suites.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Row>>,
    failing_reads: AtomicUsize,
    failing_appends: AtomicUsize,
    list_calls: AtomicUsize,
    append_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows: Mutex::new(rows),
            ..Self::default()
        }
    }

    /// Append without going through the trait, as another client would.
    pub fn push(&self, row: Row) {
        self.lock().push(row);
    }

    pub fn rows(&self) -> Vec<Row> {
        self.lock().clone()
    }

    /// Remove everything after the first `len` rows.
    pub fn truncate(&self, len: usize) {
        self.lock().truncate(len);
    }

    /// Make the next `n` reads fail.
    pub fn fail_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` appends fail.
    pub fn fail_appends(&self, n: usize) {
        self.failing_appends.store(n, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn append_calls(&self) -> usize {
        self.append_calls.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Row>> {
        // A poisoned log is still a valid log; rows are only ever pushed whole.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn list_rows(&self) -> Result<Vec<Row>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_reads) {
            return Err(StoreError::Unavailable("Sheet read failed".into()));
        }
        Ok(self.rows())
    }

    async fn append_row(&self, row: Row) -> Result<(), StoreError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_appends) {
            return Err(StoreError::Unavailable("Append failed".into()));
        }
        self.push(row);
        Ok(())
    }
}
