use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid service account key: {0}")]
    Credentials(String),

    #[error("Failed to sign token request: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{op} failed ({status})")]
    Status {
        op: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
