/// SheetChat crypto.
///
/// Every member of a room derives the same AES-256-GCM key from the shared
/// seed phrase. Each message is sealed on its own under a fresh random nonce.

pub mod envelope;
pub mod keys;

pub use envelope::{open, seal};
pub use keys::{RoomKey, derive_key};
