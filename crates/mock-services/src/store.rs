//! In-memory record source.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use record_store::{
    check_batch, ListRecordsOptions, Record, RecordPage, RecordPatch, RecordSource, StoreError,
    FieldValue,
};

#[derive(Debug, Default)]
struct State {
    records: Vec<Record>,
    list_calls: Vec<ListRecordsOptions>,
    updates: Vec<Vec<RecordPatch>>,
    failing_lists: usize,
    failing_updates: Vec<String>,
}

/// A single in-memory table.
///
/// Listing returns the records whose paid column is not the text `"true"`,
/// which is how the charger's filter formula behaves against the real
/// store. Updates are applied to the stored records so later cycles see
/// them. Page offsets are record ids, so a page continues where the
/// previous one ended even if its records were marked paid in between.
/// Clones share the same table.
#[derive(Debug, Clone)]
pub struct MemoryRecordSource {
    paid_field: String,
    state: Arc<Mutex<State>>,
}

impl MemoryRecordSource {
    /// Create an empty table whose paid flag lives in `paid_field`.
    pub fn new(paid_field: impl Into<String>) -> Self {
        Self {
            paid_field: paid_field.into(),
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Add a record.
    pub fn with_record(self, record: Record) -> Self {
        self.lock().records.push(record);
        self
    }

    /// Make the next `count` list calls fail.
    pub fn fail_next_lists(&self, count: usize) {
        self.lock().failing_lists = count;
    }

    /// Make every update touching `record_id` fail.
    pub fn fail_updates_for(&self, record_id: impl Into<String>) {
        self.lock().failing_updates.push(record_id.into());
    }

    /// Current contents of the table.
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    /// Look up a record by id.
    pub fn record(&self, id: &str) -> Option<Record> {
        self.lock().records.iter().find(|r| r.id == id).cloned()
    }

    /// Every list call received, in order.
    pub fn list_calls(&self) -> Vec<ListRecordsOptions> {
        self.lock().list_calls.clone()
    }

    /// Every successful update call received, in order.
    pub fn updates(&self) -> Vec<Vec<RecordPatch>> {
        self.lock().updates.clone()
    }

    /// Every patch received, flattened.
    pub fn patches(&self) -> Vec<RecordPatch> {
        self.lock().updates.iter().flatten().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn is_paid(&self, record: &Record) -> bool {
        matches!(record.field(&self.paid_field), Some(FieldValue::Text(value)) if value == "true")
    }
}

#[async_trait]
impl RecordSource for MemoryRecordSource {
    async fn list_records(&self, options: &ListRecordsOptions) -> Result<RecordPage, StoreError> {
        let mut state = self.lock();
        state.list_calls.push(options.clone());

        if state.failing_lists > 0 {
            state.failing_lists -= 1;
            return Err(StoreError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        // The offset is the id of the first record of the next page, so
        // records patched out of the unpaid view do not shift later pages.
        let start = match &options.offset {
            Some(offset) => state
                .records
                .iter()
                .position(|record| &record.id == offset)
                .ok_or_else(|| StoreError::Api {
                    status: 422,
                    message: format!("LIST_RECORDS_ITERATOR_NOT_AVAILABLE: {}", offset),
                })?,
            None => 0,
        };
        let page_size = options.page_size.filter(|size| *size > 0).unwrap_or(100);

        let mut remaining = state.records[start..]
            .iter()
            .filter(|record| !self.is_paid(record));
        let records: Vec<Record> = remaining.by_ref().take(page_size).cloned().collect();
        let offset = remaining.next().map(|record| record.id.clone());

        Ok(RecordPage { records, offset })
    }

    async fn partial_update(&self, _table: &str, records: &[RecordPatch]) -> Result<(), StoreError> {
        check_batch(records)?;

        let mut state = self.lock();
        if records
            .iter()
            .any(|patch| state.failing_updates.contains(&patch.id))
        {
            return Err(StoreError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }

        for patch in records {
            let record = state
                .records
                .iter_mut()
                .find(|record| record.id == patch.id)
                .ok_or_else(|| StoreError::Api {
                    status: 404,
                    message: format!("record {} not found", patch.id),
                })?;
            for (name, value) in &patch.fields {
                record.fields.insert(name.clone(), value.clone());
            }
        }

        state.updates.push(records.to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "MemoryRecordSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MemoryRecordSource {
        MemoryRecordSource::new("Paid")
            .with_record(Record::new("rec1").with_field("Paid", "true"))
            .with_record(Record::new("rec2"))
            .with_record(Record::new("rec3").with_field("Paid", false))
    }

    #[tokio::test]
    async fn test_list_excludes_paid() {
        let store = table();
        let page = store
            .list_records(&ListRecordsOptions::table("Invoices"))
            .await
            .unwrap();

        let ids: Vec<&str> = page.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec2", "rec3"]);
        assert!(page.offset.is_none());
    }

    #[tokio::test]
    async fn test_list_pages() {
        let store = table();
        let first = store
            .list_records(&ListRecordsOptions::table("Invoices").with_page_size(1))
            .await
            .unwrap();
        assert_eq!(first.records[0].id, "rec2");
        assert_eq!(first.offset.as_deref(), Some("rec3"));

        let second = store
            .list_records(
                &ListRecordsOptions::table("Invoices")
                    .with_page_size(1)
                    .with_offset(first.offset),
            )
            .await
            .unwrap();
        assert_eq!(second.records[0].id, "rec3");
        assert!(second.offset.is_none());
    }

    #[tokio::test]
    async fn test_next_page_survives_paying_the_previous_one() {
        let store = MemoryRecordSource::new("Paid")
            .with_record(Record::new("rec1"))
            .with_record(Record::new("rec2"))
            .with_record(Record::new("rec3"));
        let options = ListRecordsOptions::table("Invoices").with_page_size(2);

        let first = store.list_records(&options).await.unwrap();
        let ids: Vec<&str> = first.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec2"]);

        let paid = [
            RecordPatch::new("rec1").set("Paid", "true"),
            RecordPatch::new("rec2").set("Paid", "true"),
        ];
        store.partial_update("Invoices", &paid).await.unwrap();

        let second = store
            .list_records(&options.clone().with_offset(first.offset))
            .await
            .unwrap();
        let ids: Vec<&str> = second.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec3"]);
        assert!(second.offset.is_none());
    }

    #[tokio::test]
    async fn test_unknown_offset_is_rejected() {
        let store = table();
        let options = ListRecordsOptions::table("Invoices").with_offset(Some("recGone".to_string()));
        assert!(store.list_records(&options).await.is_err());
    }

    #[tokio::test]
    async fn test_update_applies_fields() {
        let store = table();
        let patch = RecordPatch::new("rec2").set("Paid", "true").set("Notes", "done");
        store.partial_update("Invoices", &[patch]).await.unwrap();

        let record = store.record("rec2").unwrap();
        assert_eq!(record.field("Notes"), Some(&FieldValue::text("done")));
        assert_eq!(store.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let store = table();
        store.fail_next_lists(1);
        store.fail_updates_for("rec2");

        assert!(store
            .list_records(&ListRecordsOptions::table("Invoices"))
            .await
            .is_err());
        assert!(store
            .list_records(&ListRecordsOptions::table("Invoices"))
            .await
            .is_ok());

        let patch = RecordPatch::new("rec2").set("Notes", "x");
        assert!(store.partial_update("Invoices", &[patch]).await.is_err());
        assert!(store.updates().is_empty());
    }
}
