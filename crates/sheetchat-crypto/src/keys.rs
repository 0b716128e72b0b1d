use anyhow::{Result, bail};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use sheetchat_types::protocol::{KDF_ITERATIONS, KDF_SALT};

/// 256-bit room key. Lives only in memory and is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct RoomKey([u8; 32]);

impl RoomKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for RoomKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RoomKey(..)")
    }
}

/// Derive the room key from a seed phrase with PBKDF2-HMAC-SHA256.
///
/// Same seed, same key: the seed is the room secret.
pub fn derive_key(seed: &str) -> Result<RoomKey> {
    if seed.is_empty() {
        bail!("Seed must not be empty");
    }

    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(seed.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);
    let room_key = RoomKey(key);
    key.zeroize();

    Ok(room_key)
}
