//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use payment_processor::{ProcessorError, StripeConfig};
use reconciler::{FieldMap, SchedulerConfig};
use record_store::{StoreConfig, StoreError};

/// Default pause between records and between cycles, in milliseconds.
const DEFAULT_PAUSE_MS: u64 = 1000;

/// Charger configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Airtable connection.
    pub store: StoreConfig,
    /// Stripe connection.
    pub stripe: StripeConfig,
    /// Table holding the invoices.
    pub table: String,
    /// Column names.
    pub fields: FieldMap,
    /// Pause after each record that made an external call.
    pub record_pause: Duration,
    /// Pause between cycles.
    pub cycle_pause: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `AIRTABLE_API_KEY` | Airtable access token | (required) |
    /// | `AIRTABLE_BASE_ID` | Base id, `app...` | (required) |
    /// | `AIRTABLE_API_URL` | Airtable API host | `https://api.airtable.com` |
    /// | `TABLENAME` | Invoice table | (required) |
    /// | `STRIPE_API_KEY` | Secret or restricted key | (required) |
    /// | `STRIPE_API_URL` | Stripe API host | `https://api.stripe.com` |
    /// | `STRIPE_CUSTOMER_ID_COLUMN` | Customer id column | (required) |
    /// | `INVOICE_AMOUNT_COLUMN` | Amount column | (required) |
    /// | `PAID_COLUMN` | Paid flag column | (required) |
    /// | `NOTES_COLUMN` | Notes column | (required) |
    /// | `CURRENCY_CODE_COLUMN` | Currency column | (required) |
    /// | `DATE_COLUMN` | Not-before date column | (none) |
    /// | `RECORD_PAUSE_MS` | Pause between records | `1000` |
    /// | `CYCLE_PAUSE_MS` | Pause between cycles | `1000` |
    pub fn from_env() -> Result<Self, ConfigError> {
        let store = StoreConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let table = required("TABLENAME")?;

        let fields = FieldMap {
            customer_id: required("STRIPE_CUSTOMER_ID_COLUMN")?,
            amount: required("INVOICE_AMOUNT_COLUMN")?,
            paid: required("PAID_COLUMN")?,
            notes: required("NOTES_COLUMN")?,
            currency: required("CURRENCY_CODE_COLUMN")?,
            not_before: optional("DATE_COLUMN"),
        };

        Ok(Self {
            store,
            stripe,
            table,
            fields,
            record_pause: pause("RECORD_PAUSE_MS")?,
            cycle_pause: pause("CYCLE_PAUSE_MS")?,
        })
    }

    /// Scheduler settings derived from this configuration.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(&self.table, self.fields.clone())
            .with_pauses(self.record_pause, self.cycle_pause)
    }
}

fn optional(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    optional(var).ok_or(ConfigError::Missing(var))
}

fn pause(var: &'static str) -> Result<Duration, ConfigError> {
    match optional(var) {
        None => Ok(Duration::from_millis(DEFAULT_PAUSE_MS)),
        Some(value) => value
            .parse()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidPause { var, value }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} must be a whole number of milliseconds, got {value:?}")]
    InvalidPause { var: &'static str, value: String },

    #[error("record store: {0}")]
    Store(#[from] StoreError),

    #[error("payment processor: {0}")]
    Processor(#[from] ProcessorError),
}
