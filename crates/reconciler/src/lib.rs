//! Invoice reconciliation loop.
//!
//! Each cycle lists the records not yet marked paid and, one at a time:
//!
//! 1. normalizes the billing fields into a [`BillingIntent`]
//!    (records still being filled in are skipped),
//! 2. applies the optional not-before date gate,
//! 3. charges the customer's first saved card once,
//! 4. writes the outcome back to the notes and paid columns,
//! 5. pauses before the next external call.
//!
//! # Example
//!
//! ```no_run
//! use payment_processor::StripeClient;
//! use reconciler::{FieldMap, PollScheduler, SchedulerConfig};
//! use record_store::{AirtableClient, StoreConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fields = FieldMap {
//!     customer_id: "Stripe Customer".to_string(),
//!     amount: "Amount".to_string(),
//!     paid: "Paid".to_string(),
//!     notes: "Notes".to_string(),
//!     currency: "Currency".to_string(),
//!     not_before: None,
//! };
//!
//! let store = AirtableClient::connect(StoreConfig::from_env()?, "Invoices").await?;
//! let stripe = StripeClient::from_env()?;
//! let scheduler = PollScheduler::new(store, stripe, SchedulerConfig::new("Invoices", fields));
//!
//! let shutdown = CancellationToken::new();
//! scheduler.run(shutdown).await;
//! # Ok(())
//! # }
//! ```

pub mod charge;
pub mod eligibility;
pub mod fields;
pub mod normalize;
pub mod scheduler;
pub mod writer;

pub use charge::{to_minor_units, ChargeFailure, ChargeOutcome, Charger, SUPPORTED_CURRENCY};
pub use eligibility::{check as check_eligibility, parse_not_before, Eligibility};
pub use fields::FieldMap;
pub use normalize::{normalize, BillingIntent, SkipReason};
pub use scheduler::{
    Clock, CycleError, CycleReport, PollScheduler, RecordOutcome, SchedulerConfig, DEFAULT_PAUSE,
};
pub use writer::{note_for, patch_for, PAID_VALUE};

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
