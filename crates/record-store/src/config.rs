//! Configuration types for record-store.

use std::env;

use crate::error::StoreError;

/// Default Airtable API host.
pub const DEFAULT_API_URL: &str = "https://api.airtable.com";

/// Configuration for connecting to an Airtable base.
#[derive(Clone)]
pub struct StoreConfig {
    /// API host (e.g., "https://api.airtable.com").
    pub api_url: String,
    /// Personal access token or API key.
    pub api_key: String,
    /// Base identifier, e.g. "appXXXXXXXXXXXXXX".
    pub base_id: String,
}

impl StoreConfig {
    /// Create a new configuration against the public Airtable API.
    pub fn new(api_key: impl Into<String>, base_id: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            base_id: base_id.into(),
        }
    }

    /// Point the client at a different API host.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required: `AIRTABLE_API_KEY`, `AIRTABLE_BASE_ID`.
    /// Optional: `AIRTABLE_API_URL` (default: https://api.airtable.com).
    pub fn from_env() -> Result<Self, StoreError> {
        let api_key = env::var("AIRTABLE_API_KEY")
            .map_err(|_| StoreError::Config("AIRTABLE_API_KEY not set".to_string()))?;
        let base_id = env::var("AIRTABLE_BASE_ID")
            .map_err(|_| StoreError::Config("AIRTABLE_BASE_ID not set".to_string()))?;
        let api_url =
            env::var("AIRTABLE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let config = Self {
            api_url,
            api_key,
            base_id,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the key is present and the base id is well formed.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.api_key.trim().is_empty() {
            return Err(StoreError::Config("API key is empty".to_string()));
        }

        let base = self.base_id.as_str();
        let well_formed = base.len() > 3
            && base.starts_with("app")
            && base.chars().all(|c| c.is_ascii_alphanumeric());
        if !well_formed {
            return Err(StoreError::Config(format!("malformed base id: {:?}", base)));
        }

        Ok(())
    }

    /// URL of a table inside the configured base.
    pub fn table_url(&self, table: &str) -> String {
        format!(
            "{}/v0/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.base_id,
            urlencoding::encode(table)
        )
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("base_id", &self.base_id)
            .finish()
    }
}
