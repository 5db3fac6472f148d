//! Mock collaborators for testing the reconciliation loop.
//!
//! - `MemoryRecordSource` - an in-memory table implementing `RecordSource`
//! - `ScriptedProcessor` - a `PaymentProcessor` that charges nothing and
//!   records every call
//!
//! # Example
//!
//! ```rust
//! use mock_services::{MemoryRecordSource, ScriptedProcessor};
//! use record_store::Record;
//!
//! let store = MemoryRecordSource::new("Paid")
//!     .with_record(Record::new("rec1").with_field("Customer", "cus_123"));
//! let processor = ScriptedProcessor::new().with_card("cus_123", "pm_1");
//!
//! assert_eq!(store.records().len(), 1);
//! assert!(processor.calls().is_empty());
//! ```

mod processor;
mod store;

pub use processor::{ProcessorCall, ScriptedProcessor};
pub use store::MemoryRecordSource;
