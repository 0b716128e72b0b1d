use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};

use sheetchat_types::protocol::DEFAULT_POLL_INTERVAL_MS;

/// Spreadsheet ids that are clearly a template left unedited.
const PLACEHOLDER_IDS: &[&str] = &["YOUR_SPREADSHEET_ID_HERE", "change-me"];

/// Room secrets shipped in `.env.example`; anyone could derive that key.
const PLACEHOLDER_SEEDS: &[&str] = &["change-me", "YOUR_ROOM_SECRET_HERE"];

pub enum Backend {
    /// In-process log, nothing leaves the machine
    Offline,
    Sheets {
        spreadsheet_id: String,
        sheet_name: String,
        service_account: Option<PathBuf>,
        /// Externally managed bearer token, used instead of the key file
        access_token: Option<String>,
    },
}

pub struct Config {
    pub author: String,
    pub seed: String,
    pub poll_interval: Duration,
    pub backend: Backend,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let author = get("SHEETCHAT_AUTHOR").unwrap_or_default();
        let seed = get("SHEETCHAT_SEED").unwrap_or_default();
        if seed.is_empty() || PLACEHOLDER_SEEDS.contains(&seed.as_str()) {
            bail!("SHEETCHAT_SEED is unset or still a placeholder");
        }

        let poll_ms: u64 = match get("SHEETCHAT_POLL_INTERVAL_MS") {
            Some(v) => v.parse()?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };
        if poll_ms == 0 {
            bail!("SHEETCHAT_POLL_INTERVAL_MS must be greater than zero");
        }

        let offline = get("SHEETCHAT_OFFLINE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let backend = if offline {
            Backend::Offline
        } else {
            let spreadsheet_id = get("SHEETCHAT_SPREADSHEET_ID").unwrap_or_default();
            if spreadsheet_id.is_empty() || PLACEHOLDER_IDS.contains(&spreadsheet_id.as_str()) {
                bail!("SHEETCHAT_SPREADSHEET_ID is unset or still a placeholder");
            }

            let service_account = get("SHEETCHAT_SERVICE_ACCOUNT").map(PathBuf::from);
            let access_token = get("SHEETCHAT_ACCESS_TOKEN").filter(|t| !t.is_empty());
            if service_account.is_none() && access_token.is_none() {
                bail!("Set SHEETCHAT_SERVICE_ACCOUNT (or SHEETCHAT_ACCESS_TOKEN)");
            }

            Backend::Sheets {
                spreadsheet_id,
                sheet_name: get("SHEETCHAT_SHEET_NAME").unwrap_or_else(|| "messages".into()),
                service_account,
                access_token,
            }
        };

        Ok(Self {
            author,
            seed,
            poll_interval: Duration::from_millis(poll_ms),
            backend,
        })
    }
}
