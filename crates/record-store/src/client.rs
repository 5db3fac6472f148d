//! Airtable HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::source::{check_batch, RecordSource};
use crate::types::{ListRecordsOptions, RecordPage, RecordPatch, UpdateRequest};

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

/// The API reports errors either as a bare code or as an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    /// e.g. `"NOT_FOUND"`.
    Code(String),
    /// e.g. `{"type": "INVALID_PERMISSIONS", "message": "..."}`.
    Object {
        #[serde(rename = "type")]
        kind: String,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ErrorDetail {
    fn describe(self) -> String {
        match self {
            ErrorDetail::Code(code) => code,
            ErrorDetail::Object {
                kind,
                message: Some(message),
            } => format!("{}: {}", kind, message),
            ErrorDetail::Object {
                kind,
                message: None,
            } => kind,
        }
    }
}

/// Client for the Airtable records API.
///
/// Holds a single connection pool; clone it freely.
#[derive(Clone)]
pub struct AirtableClient {
    http: Client,
    config: StoreConfig,
}

impl AirtableClient {
    /// Create a client without contacting the API.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(StoreError::Http)?;

        Ok(Self { http, config })
    }

    /// Create a client and verify that the credentials can read `table`.
    pub async fn connect(config: StoreConfig, table: &str) -> Result<Self, StoreError> {
        let client = Self::new(config)?;

        let probe = ListRecordsOptions::table(table).with_page_size(1);
        client.list_records(&probe).await?;
        info!(
            "Connected to Airtable base {} at {}",
            client.config.base_id, client.config.api_url
        );

        Ok(client)
    }

    /// Get the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Turn a non-2xx response into an error.
    async fn check_status(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => parsed.error.describe(),
            Err(_) => body,
        };

        let status = status.as_u16();
        if status == 401 || status == 403 {
            Err(StoreError::Unauthorized { status, message })
        } else {
            Err(StoreError::Api { status, message })
        }
    }
}

#[async_trait]
impl RecordSource for AirtableClient {
    async fn list_records(&self, options: &ListRecordsOptions) -> Result<RecordPage, StoreError> {
        if options.table.is_empty() {
            return Err(StoreError::Config("must provide a table name".to_string()));
        }

        let url = self.config.table_url(&options.table);
        debug!("Listing records: {} (offset={:?})", url, options.offset);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .query(&options.query_pairs())
            .send()
            .await
            .map_err(StoreError::Http)?;

        let response = Self::check_status(response).await?;
        let body = response.text().await.map_err(StoreError::Http)?;
        let page: RecordPage = serde_json::from_str(&body)?;

        debug!("Listed {} records from {}", page.records.len(), options.table);
        Ok(page)
    }

    async fn partial_update(&self, table: &str, records: &[RecordPatch]) -> Result<(), StoreError> {
        check_batch(records)?;
        if records.is_empty() {
            return Ok(());
        }

        let url = self.config.table_url(table);
        debug!("Updating {} records in {}", records.len(), table);

        let response = self
            .http
            .patch(&url)
            .bearer_auth(&self.config.api_key)
            .json(&UpdateRequest { records })
            .send()
            .await
            .map_err(StoreError::Http)?;

        Self::check_status(response).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "Airtable"
    }
}

impl std::fmt::Debug for AirtableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableClient")
            .field("config", &self.config)
            .finish()
    }
}
