//! Record types exchanged with the Airtable API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw value of a single record field as returned by the API.
///
/// Lookup and rollup fields arrive as lists even when they hold one value,
/// so `List` is kept distinct from the scalar shapes. Anything the other
/// variants don't cover (objects such as attachments, `null`) lands in
/// `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text, single select, date and most other string-typed columns.
    Text(String),
    /// Number, currency and percent columns.
    Number(f64),
    /// Checkbox columns.
    Bool(bool),
    /// Linked records, lookups and array rollups.
    List(Vec<FieldValue>),
    /// Any other JSON shape.
    Other(serde_json::Value),
}

impl FieldValue {
    /// Convenience constructor for a text value.
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// A single record (row) of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Record identifier, e.g. "recXXXXXXXXXXXXXX".
    pub id: String,

    /// Creation timestamp as reported by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,

    /// Field values keyed by column name. Empty cells are omitted by the API.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Create an empty record with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_time: None,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value by column name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// A partial update for one record. Only the listed fields are written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPatch {
    /// Target record.
    pub id: String,
    /// Fields to overwrite.
    pub fields: BTreeMap<String, FieldValue>,
}

impl RecordPatch {
    /// Create an empty patch for a record.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field to the patch.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Options for listing records. Only the options this system needs are
/// exposed.
#[derive(Debug, Clone, Default)]
pub struct ListRecordsOptions {
    /// Table name or id.
    pub table: String,
    /// Restrict the returned fields to these columns.
    pub fields: Vec<String>,
    /// Airtable formula; only records for which it is truthy are returned.
    pub filter_by_formula: Option<String>,
    /// Records per page (the API caps this at 100).
    pub page_size: Option<usize>,
    /// Continuation token from a previous page.
    pub offset: Option<String>,
}

impl ListRecordsOptions {
    /// Create options for listing a table.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Project only the given fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Filter records by formula.
    pub fn with_filter(mut self, formula: impl Into<String>) -> Self {
        self.filter_by_formula = Some(formula.into());
        self
    }

    /// Set the page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Continue from a previous page.
    pub fn with_offset(mut self, offset: Option<String>) -> Self {
        self.offset = offset;
        self
    }

    /// Encode as query parameters, in the format the API documents.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|field| ("fields[]".to_string(), field.clone()))
            .collect();

        if let Some(page_size) = self.page_size.filter(|size| *size > 0) {
            pairs.push(("pageSize".to_string(), page_size.to_string()));
        }
        if let Some(formula) = self.filter_by_formula.as_ref().filter(|f| !f.is_empty()) {
            pairs.push(("filterByFormula".to_string(), formula.clone()));
        }
        if let Some(offset) = &self.offset {
            pairs.push(("offset".to_string(), offset.clone()));
        }

        pairs
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordPage {
    /// Records on this page.
    #[serde(default)]
    pub records: Vec<Record>,
    /// Present when more records are available.
    #[serde(default)]
    pub offset: Option<String>,
}

/// Request body for a partial update.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateRequest<'a> {
    pub records: &'a [RecordPatch],
}
