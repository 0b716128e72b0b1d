use serde::{Deserialize, Serialize};

// -- OAuth --

/// JWT claim set for the service-account bearer grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// Space-delimited scope list.
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds. Google always sends it; treat absence as one hour.
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

// -- Sheets values API --

/// Response of `values.get`. `values` is omitted entirely for an empty range.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<String>>,
}

/// Body of `values.append`.
#[derive(Debug, Serialize)]
pub struct AppendRequest {
    pub values: Vec<Vec<String>>,
}
