use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use sheetchat_types::Row;
use sheetchat_types::wire::{AppendRequest, ValueRange};

use crate::{RowStore, StoreError, TokenSource};

pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// Leading rows that hold column titles rather than messages.
    pub header_rows: usize,
    pub api_base: String,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            header_rows: 1,
            api_base: SHEETS_API_BASE.to_string(),
        }
    }

    /// The four message columns.
    pub fn range(&self) -> String {
        format!("{}!A:D", self.sheet_name)
    }

    pub fn values_url(&self) -> Result<Url, StoreError> {
        self.endpoint(&self.range())
    }

    pub fn append_url(&self) -> Result<Url, StoreError> {
        let mut url = self.endpoint(&format!("{}:append", self.range()))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");
        Ok(url)
    }

    fn endpoint(&self, last_segment: &str) -> Result<Url, StoreError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| StoreError::Config(format!("Bad API base '{}': {}", self.api_base, e)))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::Config(format!("API base '{}' cannot take a path", self.api_base)))?
            .pop_if_empty()
            .push(&self.spreadsheet_id)
            .push("values")
            .push(last_segment);
        Ok(url)
    }
}

/// Google Sheets as an append-only row log.
pub struct SheetsStore {
    http: Client,
    config: SheetsConfig,
    tokens: Arc<dyn TokenSource>,
}

impl SheetsStore {
    pub fn new(http: Client, config: SheetsConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }
}

#[async_trait]
impl RowStore for SheetsStore {
    async fn list_rows(&self) -> Result<Vec<Row>, StoreError> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .http
            .get(self.config.values_url()?)
            .bearer_auth(token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                op: "Sheet read",
                status,
            });
        }

        let body: ValueRange = resp.json().await?;
        let rows = rows_from_values(body.values, self.config.header_rows);
        debug!("Read {} rows from {}", rows.len(), self.config.range());
        Ok(rows)
    }

    async fn append_row(&self, row: Row) -> Result<(), StoreError> {
        let token = self.tokens.access_token().await?;

        let body = AppendRequest {
            values: vec![row.into_cells()],
        };

        let resp = self
            .http
            .post(self.config.append_url()?)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                op: "Append",
                status,
            });
        }

        Ok(())
    }
}

/// Drop the header rows and turn the rest into [`Row`]s.
pub fn rows_from_values(values: Vec<Vec<String>>, header_rows: usize) -> Vec<Row> {
    values
        .into_iter()
        .skip(header_rows)
        .map(Row::from_cells)
        .collect()
}
