//! Google Sheets implementation of [`SheetSync`].
//!
//! Rows are appended with the `values:append` endpoint:
//!
//! ```text
//! POST {endpoint}/v4/spreadsheets/{id}/values/{sheet}!A:Z:append?valueInputOption=USER_ENTERED
//! Authorization: Bearer {token}
//! {"values": [[...row cells...]]}
//! ```

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use crate::error::SyncError;

use super::{SheetSync, SyncRecord};

/// Public Google Sheets API base URL.
pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";

/// Appends rows to a Google spreadsheet using a bearer access token.
#[derive(Clone)]
pub struct GoogleSheetsSync {
    client: reqwest::Client,
    endpoint: Url,
    spreadsheet_id: String,
    access_token: String,
}

impl GoogleSheetsSync {
    /// Create a client for the public Sheets API.
    pub fn new(
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, SyncError> {
        Self::with_endpoint(DEFAULT_SHEETS_ENDPOINT, spreadsheet_id, access_token)
    }

    /// Create a client against a custom API base (proxies, test servers).
    pub fn with_endpoint(
        endpoint: &str,
        spreadsheet_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, SyncError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SyncError::Configuration(format!("invalid endpoint '{}': {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(SyncError::Configuration(format!(
                "endpoint '{}' cannot be used as a base URL",
                endpoint
            )));
        }

        let spreadsheet_id = spreadsheet_id.into();
        if spreadsheet_id.is_empty() {
            return Err(SyncError::Configuration(
                "spreadsheet id is empty".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            spreadsheet_id,
            access_token: access_token.into(),
        })
    }

    /// Spreadsheet this client appends to.
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Build the append URL for a sheet.
    pub fn append_url(&self, sheet: &str) -> Url {
        let mut url = self.endpoint.clone();
        let range = format!("{}!A:Z:append", sheet);
        // Checked in the constructor
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        }
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        url
    }
}

#[async_trait]
impl SheetSync for GoogleSheetsSync {
    async fn append(&self, record: &SyncRecord) -> Result<(), SyncError> {
        let body = json!({ "values": [record.row()] });

        let response = self
            .client
            .post(self.append_url(record.sheet()))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
