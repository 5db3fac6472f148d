//! Writing a charge outcome back to its record.

use record_store::{RecordPatch, RecordSource, StoreError};

use crate::charge::ChargeOutcome;
use crate::fields::FieldMap;

/// Value written to the paid column after a successful charge.
pub const PAID_VALUE: &str = "true";

/// Human-readable note for an outcome.
pub fn note_for(outcome: &ChargeOutcome) -> String {
    match outcome {
        ChargeOutcome::Success { confirmation_id } => {
            format!("Payment confirmation number: {}", confirmation_id)
        }
        ChargeOutcome::Failure { reason } => format!("Error charging customer: {}", reason),
    }
}

/// The patch for one outcome: notes always, paid only on success.
pub fn patch_for(record_id: &str, outcome: &ChargeOutcome, fields: &FieldMap) -> RecordPatch {
    let patch = RecordPatch::new(record_id).set(fields.notes.as_str(), note_for(outcome));
    if outcome.is_success() {
        patch.set(fields.paid.as_str(), PAID_VALUE)
    } else {
        patch
    }
}

/// Send a single patch.
pub async fn write<S>(store: &S, table: &str, patch: RecordPatch) -> Result<(), StoreError>
where
    S: RecordSource + ?Sized,
{
    store.partial_update(table, std::slice::from_ref(&patch)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::ChargeFailure;
    use crate::fields::test_map;
    use record_store::FieldValue;

    #[test]
    fn test_success_patch() {
        let outcome = ChargeOutcome::Success {
            confirmation_id: "pi_abc".to_string(),
        };
        let patch = patch_for("rec1", &outcome, &test_map());

        assert_eq!(patch.id, "rec1");
        assert_eq!(patch.fields.len(), 2);
        assert_eq!(patch.fields.get("Paid"), Some(&FieldValue::text("true")));
        match patch.fields.get("Notes") {
            Some(FieldValue::Text(note)) => assert!(note.contains("pi_abc")),
            other => panic!("Expected text note, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_patch_leaves_paid_unset() {
        let outcome = ChargeOutcome::Failure {
            reason: ChargeFailure::UnsupportedCurrency("eur".to_string()),
        };
        let patch = patch_for("rec2", &outcome, &test_map());

        assert_eq!(patch.fields.len(), 1);
        assert!(patch.fields.get("Paid").is_none());
        match patch.fields.get("Notes") {
            Some(FieldValue::Text(note)) => assert!(note.contains("currency not supported")),
            other => panic!("Expected text note, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_write_targets_one_record() {
        let store = mock_services::MemoryRecordSource::new("Paid")
            .with_record(record_store::Record::new("rec1").with_field("Customer Name", "Ada"));
        let outcome = ChargeOutcome::Success {
            confirmation_id: "pi_abc".to_string(),
        };

        write(&store, "Invoices", patch_for("rec1", &outcome, &test_map()))
            .await
            .unwrap();

        let updates = store.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].len(), 1);

        let record = store.record("rec1").unwrap();
        assert_eq!(record.field("Customer Name"), Some(&FieldValue::text("Ada")));
        assert_eq!(record.field("Paid"), Some(&FieldValue::text("true")));
    }
}
