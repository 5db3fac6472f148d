//! The `RecordSource` trait and helpers built on it.

use async_trait::async_trait;
use tracing::debug;

use crate::error::StoreError;
use crate::types::{ListRecordsOptions, RecordPage, RecordPatch};

/// Largest page the list endpoint will return.
pub const MAX_PAGE_SIZE: usize = 100;

/// Largest number of records accepted by a single update call.
pub const MAX_UPDATE_BATCH: usize = 10;

/// A tabular store of records that can be listed and partially updated.
///
/// This trait is object-safe and can be used with `Box<dyn RecordSource>`.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// List one page of records matching the options.
    async fn list_records(&self, options: &ListRecordsOptions) -> Result<RecordPage, StoreError>;

    /// Write the given fields on the given records, leaving every other
    /// field untouched.
    ///
    /// Implementations must reject more than [`MAX_UPDATE_BATCH`] records
    /// with [`StoreError::BatchTooLarge`] before sending anything.
    async fn partial_update(&self, table: &str, records: &[RecordPatch]) -> Result<(), StoreError>;

    /// Get a human-readable name for this store.
    fn name(&self) -> &str;
}

/// Reject an update batch that is over the per-call limit.
pub fn check_batch(records: &[RecordPatch]) -> Result<(), StoreError> {
    if records.len() > MAX_UPDATE_BATCH {
        return Err(StoreError::BatchTooLarge {
            count: records.len(),
            max: MAX_UPDATE_BATCH,
        });
    }
    Ok(())
}

/// Send any number of patches, split into calls of at most
/// [`MAX_UPDATE_BATCH`] records.
///
/// Stops at the first failing call; earlier chunks stay applied.
pub async fn update_in_batches<S>(
    source: &S,
    table: &str,
    records: &[RecordPatch],
) -> Result<(), StoreError>
where
    S: RecordSource + ?Sized,
{
    for (index, chunk) in records.chunks(MAX_UPDATE_BATCH).enumerate() {
        debug!("Updating chunk {} ({} records) in {}", index, chunk.len(), table);
        source.partial_update(table, chunk).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patches(count: usize) -> Vec<RecordPatch> {
        (0..count)
            .map(|i| RecordPatch::new(format!("rec{}", i)).set("Notes", "n"))
            .collect()
    }

    #[test]
    fn test_check_batch_limit() {
        assert!(check_batch(&patches(0)).is_ok());
        assert!(check_batch(&patches(10)).is_ok());

        match check_batch(&patches(11)) {
            Err(StoreError::BatchTooLarge { count, max }) => {
                assert_eq!(count, 11);
                assert_eq!(max, 10);
            }
            other => panic!("Expected BatchTooLarge, got {:?}", other),
        }
    }
}
