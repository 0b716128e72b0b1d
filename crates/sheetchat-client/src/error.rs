use thiserror::Error;

use sheetchat_store::StoreError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Please provide all fields ({0} is missing)")]
    MissingField(&'static str),

    #[error("Message is empty")]
    EmptyMessage,

    #[error("Message too long ({len} UTF-16 units, max {max})")]
    MessageTooLong { len: usize, max: usize },

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Failed to encrypt message: {0}")]
    Encryption(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How the caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input or configuration. Nothing reached the network.
    Input,
    /// I/O trouble. Show it and keep going; the next poll retries.
    Transient,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingField(_)
            | Self::EmptyMessage
            | Self::MessageTooLong { .. }
            | Self::KeyDerivation(_) => ErrorKind::Input,
            Self::Encryption(_) | Self::Store(_) => ErrorKind::Transient,
        }
    }
}
