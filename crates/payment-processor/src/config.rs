//! Configuration for the Stripe client.

use std::env;

use crate::error::ProcessorError;

/// Default Stripe API host.
pub const DEFAULT_API_URL: &str = "https://api.stripe.com";

/// Configuration for `StripeClient`.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe API URL.
    pub api_url: String,

    /// Secret or restricted API key.
    pub api_key: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            timeout_secs: 80,
        }
    }
}

impl StripeConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `STRIPE_API_KEY` - secret (`sk_...`) or restricted (`rk_...`) key
    ///
    /// Optional environment variables:
    /// - `STRIPE_API_URL` - API URL (default: https://api.stripe.com)
    pub fn from_env() -> Result<Self, ProcessorError> {
        let api_key = env::var("STRIPE_API_KEY")
            .map_err(|_| ProcessorError::Configuration("STRIPE_API_KEY not set".to_string()))?;

        let api_url = env::var("STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let config = Self {
            api_url,
            api_key,
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Create a new config builder.
    pub fn builder() -> StripeConfigBuilder {
        StripeConfigBuilder::default()
    }

    /// Reject keys that cannot possibly be server-side keys.
    pub fn validate(&self) -> Result<(), ProcessorError> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ProcessorError::Configuration("API key is empty".to_string()));
        }
        if !(key.starts_with("sk_") || key.starts_with("rk_")) {
            return Err(ProcessorError::Configuration(
                "API key must be a secret (sk_) or restricted (rk_) key".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Builder for StripeConfig.
#[derive(Debug, Default)]
pub struct StripeConfigBuilder {
    config: StripeConfig,
}

impl StripeConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> StripeConfig {
        self.config
    }
}
