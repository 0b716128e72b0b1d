//! Row storage for SheetChat.
//!
//! The chat core only needs two capabilities from the outside world: a
//! bearer token, and an append-only table it can list and append to. Both
//! are traits here so the session can run against Google Sheets or an
//! in-process table.

pub mod auth;
pub mod error;
pub mod memory;
pub mod sheets;

use async_trait::async_trait;

use sheetchat_types::Row;

pub use auth::{ServiceAccountKey, ServiceAccountTokenSource, StaticToken};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use sheets::{SheetsConfig, SheetsStore};

/// Supplies OAuth bearer tokens.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, StoreError>;
}

/// Append-only log of rows, in insertion order.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Every data row currently in the store.
    async fn list_rows(&self) -> Result<Vec<Row>, StoreError>;

    async fn append_row(&self, row: Row) -> Result<(), StoreError>;
}
