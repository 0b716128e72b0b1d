//! Protocol constants. Every client must agree on these, so none of them
//! are configurable.

/// Version tag written to the fourth column of every row.
pub const PROTOCOL_VERSION: &str = "v1";

/// PBKDF2 salt shared by all deployments.
pub const KDF_SALT: &[u8] = b"ghpages-chat-v1";

/// PBKDF2-HMAC-SHA256 iteration count.
pub const KDF_ITERATIONS: u32 = 100_000;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Maximum message length, in UTF-16 code units (what a browser reports as
/// `text.length`), so both clients accept exactly the same messages.
pub const MAX_MESSAGE_CHARS: usize = 1000;

/// Symbols the spin command draws from.
pub const SPIN_SYMBOLS: [&str; 4] = ["➉︎", "❤︎", "☮︎", "☆︎"];

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;
