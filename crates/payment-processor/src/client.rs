//! Stripe HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::StripeConfig;
use crate::error::ProcessorError;
use crate::processor::PaymentProcessor;
use crate::types::{ApiErrorBody, NewPaymentIntent, PaymentIntent, PaymentMethod, PaymentMethodList};

/// Client for the Stripe REST API.
///
/// Holds a single connection pool; clone it freely.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    config: StripeConfig,
}

impl StripeClient {
    /// Create a new client.
    pub fn new(config: StripeConfig) -> Result<Self, ProcessorError> {
        config.validate()?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ProcessorError::Http)?;

        Ok(Self { http, config })
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, ProcessorError> {
        Self::new(StripeConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Decode a successful response, or turn an error response into
    /// `ProcessorError::Api`.
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProcessorError> {
        let status = response.status();
        let body = response.text().await.map_err(ProcessorError::Http)?;

        if !status.is_success() {
            // Try to parse as API error
            if let Ok(api_error) = serde_json::from_str::<ApiErrorBody>(&body) {
                let detail = api_error.error;
                return Err(ProcessorError::Api {
                    status: status.as_u16(),
                    message: detail
                        .message
                        .or_else(|| detail.code.clone())
                        .unwrap_or_else(|| "unknown error".to_string()),
                    kind: detail.kind,
                    code: detail.code,
                });
            }

            return Err(ProcessorError::Api {
                status: status.as_u16(),
                kind: None,
                code: None,
                message: body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| ProcessorError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        debug!("Listing {} payment methods for {}", method_type, customer_id);

        let response = self
            .http
            .get(self.url("payment_methods"))
            .bearer_auth(&self.config.api_key)
            .query(&[("customer", customer_id), ("type", method_type)])
            .send()
            .await
            .map_err(ProcessorError::Http)?;

        let list: PaymentMethodList = Self::decode(response).await?;
        Ok(list.data)
    }

    async fn create_payment_intent(
        &self,
        params: &NewPaymentIntent,
    ) -> Result<PaymentIntent, ProcessorError> {
        debug!(
            "Creating payment intent: {} {} for {}",
            params.amount, params.currency, params.customer
        );

        let response = self
            .http
            .post(self.url("payment_intents"))
            .bearer_auth(&self.config.api_key)
            .form(&params.form())
            .send()
            .await
            .map_err(ProcessorError::Http)?;

        Self::decode(response).await
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentIntent, ProcessorError> {
        debug!("Confirming payment intent {} with {}", intent_id, payment_method_id);

        let path = format!("payment_intents/{}/confirm", urlencoding::encode(intent_id));
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.config.api_key)
            .form(&[("payment_method", payment_method_id)])
            .send()
            .await
            .map_err(ProcessorError::Http)?;

        Self::decode(response).await
    }

    fn name(&self) -> &str {
        "Stripe"
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("config", &self.config)
            .finish()
    }
}
