use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng, rand_core::RngCore},
};
use anyhow::{Result, anyhow};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use tracing::debug;

use sheetchat_types::Message;
use sheetchat_types::protocol::NONCE_LEN;

use crate::keys::RoomKey;

/// Seal a message into an envelope: base64(nonce || ciphertext+tag).
pub fn seal(key: &RoomKey, message: &Message) -> Result<String> {
    let plaintext = serde_json::to_vec(message)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|e| anyhow!("Encryption failed: {}", e))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(output))
}

/// Open an envelope. Returns `None` on any failure: a bad row must never
/// keep the rest of the log from rendering.
pub fn open(key: &RoomKey, envelope: &str) -> Option<Message> {
    match try_open(key, envelope) {
        Ok(message) => Some(message),
        Err(e) => {
            debug!("Dropping undecryptable envelope: {}", e);
            None
        }
    }
}

fn try_open(key: &RoomKey, envelope: &str) -> Result<Message> {
    let data = BASE64.decode(envelope.trim())?;
    if data.len() < NONCE_LEN {
        return Err(anyhow!("Envelope too short for nonce"));
    }

    let (nonce, ciphertext) = data.split_at(NONCE_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|e| anyhow!("Decryption failed: {}", e))?;

    Ok(serde_json::from_slice(&plaintext)?)
}
