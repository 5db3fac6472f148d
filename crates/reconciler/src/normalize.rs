//! Turning raw record fields into a typed billing intent.

use chrono::NaiveDate;
use record_store::{FieldValue, Record};
use tracing::warn;

use crate::eligibility::parse_not_before;
use crate::fields::FieldMap;

/// What to charge for one record, derived fresh every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BillingIntent {
    pub customer_id: String,
    /// Lower-cased ISO code.
    pub currency: String,
    /// Major currency units.
    pub amount: f64,
    pub not_before: Option<NaiveDate>,
}

/// Why a record was not turned into a [`BillingIntent`].
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// A required column is empty; someone is probably still filling the
    /// record in.
    MissingField(String),
    /// A column holds a value of the wrong type and needs a human to fix it.
    MalformedField { field: String, found: &'static str },
    /// The not-before date has not passed yet.
    NotYetDue(NaiveDate),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "{} not present", field),
            SkipReason::MalformedField { field, found } => {
                write!(f, "{} must be a number, found {}", field, found)
            }
            SkipReason::NotYetDue(date) => write!(f, "not billable until after {}", date),
        }
    }
}

fn shape(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Text(_) => "text",
        FieldValue::Number(_) => "number",
        FieldValue::Bool(_) => "boolean",
        FieldValue::List(_) => "list",
        FieldValue::Other(_) => "other",
    }
}

/// Textual form of a scalar value, if non-empty.
pub fn text(value: &FieldValue) -> Option<String> {
    let text = match value {
        FieldValue::Text(s) => s.clone(),
        FieldValue::Number(n) => n.to_string(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::List(_) | FieldValue::Other(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// A string identifier stored either as a scalar or as the only element of
/// a lookup/rollup list.
pub fn identifier(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(s) if !s.is_empty() => Some(s.clone()),
        FieldValue::List(items) => match items.as_slice() {
            [FieldValue::Text(s)] if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
        _ => None,
    }
}

/// An amount; only real numbers are accepted.
pub fn amount(value: &FieldValue) -> Result<f64, &'static str> {
    match value {
        FieldValue::Number(n) => Ok(*n),
        other => Err(shape(other)),
    }
}

/// Build the billing intent for a record.
///
/// The not-before column never causes a skip here: a value that does not
/// parse is logged and ignored.
pub fn normalize(record: &Record, fields: &FieldMap) -> Result<BillingIntent, SkipReason> {
    let missing = |name: &str| SkipReason::MissingField(name.to_string());

    let customer_id = record
        .field(&fields.customer_id)
        .and_then(identifier)
        .ok_or_else(|| missing(&fields.customer_id))?;

    let currency = record
        .field(&fields.currency)
        .and_then(text)
        .map(|code| code.trim().to_lowercase())
        .filter(|code| !code.is_empty())
        .ok_or_else(|| missing(&fields.currency))?;

    let raw_amount = record
        .field(&fields.amount)
        .ok_or_else(|| missing(&fields.amount))?;
    let amount = amount(raw_amount).map_err(|found| SkipReason::MalformedField {
        field: fields.amount.clone(),
        found,
    })?;

    let not_before = fields.not_before.as_deref().and_then(|column| {
        let raw = record.field(column).and_then(identifier)?;
        let parsed = parse_not_before(&raw);
        if parsed.is_none() {
            warn!(
                "Record {}: ignoring unparseable {} value {:?}",
                record.id, column, raw
            );
        }
        parsed
    });

    Ok(BillingIntent {
        customer_id,
        currency,
        amount,
        not_before,
    })
}
