//! Airtable records client.
//!
//! This crate provides a small client for the parts of the Airtable REST API
//! the invoice charger needs:
//!
//! - Listing records with field projection, a filter formula and paging
//! - Partially updating records (at most 10 per call)
//!
//! Field values are decoded into [`FieldValue`], which keeps lookup/rollup
//! lists apart from scalar values.
//!
//! # Example
//!
//! ```no_run
//! use record_store::{AirtableClient, ListRecordsOptions, RecordPatch, RecordSource, StoreConfig};
//!
//! # async fn example() -> Result<(), record_store::StoreError> {
//! let config = StoreConfig::new("pat_xxx", "appXXXXXXXXXXXXXX");
//! let client = AirtableClient::connect(config, "Invoices").await?;
//!
//! let options = ListRecordsOptions::table("Invoices")
//!     .with_fields(["Customer", "Amount"])
//!     .with_filter("NOT({Paid} = 'true')")
//!     .with_page_size(100);
//! let page = client.list_records(&options).await?;
//!
//! for record in &page.records {
//!     let patch = RecordPatch::new(&record.id).set("Notes", "seen");
//!     client.partial_update("Invoices", &[patch]).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod source;
pub mod types;

pub use client::AirtableClient;
pub use config::StoreConfig;
pub use error::StoreError;
pub use source::{check_batch, update_in_batches, RecordSource, MAX_PAGE_SIZE, MAX_UPDATE_BATCH};
pub use types::*;

// Re-export async_trait for implementors
pub use async_trait::async_trait;
