//! Stripe client for charging saved payment methods.
//!
//! Only the calls needed to charge a card already on file are covered:
//!
//! - List a customer's saved payment methods
//! - Create a payment intent
//! - Confirm a payment intent
//!
//! The [`PaymentProcessor`] trait is the seam the reconciliation loop is
//! written against; [`StripeClient`] is the production implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use payment_processor::{NewPaymentIntent, PaymentProcessor, StripeClient, CARD};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let stripe = StripeClient::from_env()?;
//!
//!     let methods = stripe.list_payment_methods("cus_123", CARD).await?;
//!     if let Some(method) = methods.first() {
//!         let intent = stripe
//!             .create_payment_intent(&NewPaymentIntent {
//!                 amount: 1999,
//!                 currency: "usd".to_string(),
//!                 customer: "cus_123".to_string(),
//!                 payment_method: method.id.clone(),
//!             })
//!             .await?;
//!         let confirmed = stripe.confirm_payment_intent(&intent.id, &method.id).await?;
//!         println!("{} is {}", confirmed.id, confirmed.status);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod processor;
mod types;

pub use client::StripeClient;
pub use config::{StripeConfig, StripeConfigBuilder, DEFAULT_API_URL};
pub use error::ProcessorError;
pub use processor::PaymentProcessor;
pub use types::{CardDetails, NewPaymentIntent, PaymentIntent, PaymentMethod, CARD};

// Re-export async_trait for implementors
pub use async_trait::async_trait;
