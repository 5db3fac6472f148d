//! Column names the reconciliation loop reads and writes.

/// Mapping from billing concepts to the table's column names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    /// Processor customer id (may be a lookup/rollup column).
    pub customer_id: String,
    /// Invoice amount in major currency units (number column).
    pub amount: String,
    /// Paid flag, written as the text "true" once charged.
    pub paid: String,
    /// Free-text notes column the outcome is written to.
    pub notes: String,
    /// ISO currency code column.
    pub currency: String,
    /// Optional `YYYY-MM-DD` column; records are not billed before it.
    pub not_before: Option<String>,
}

impl FieldMap {
    /// Columns requested when listing records.
    ///
    /// The notes column is written but never read.
    pub fn projection(&self) -> Vec<String> {
        let mut fields = vec![
            self.customer_id.clone(),
            self.amount.clone(),
            self.paid.clone(),
            self.currency.clone(),
        ];
        if let Some(date) = &self.not_before {
            fields.push(date.clone());
        }
        fields
    }

    /// Filter formula matching records that have not been marked paid.
    pub fn unpaid_formula(&self) -> String {
        format!("NOT({{{}}} = 'true')", self.paid)
    }
}

#[cfg(test)]
pub(crate) fn test_map() -> FieldMap {
    FieldMap {
        customer_id: "Stripe Customer".to_string(),
        amount: "Amount".to_string(),
        paid: "Paid".to_string(),
        notes: "Notes".to_string(),
        currency: "Currency".to_string(),
        not_before: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaid_formula() {
        assert_eq!(test_map().unpaid_formula(), "NOT({Paid} = 'true')");
    }

    #[test]
    fn test_projection_without_date() {
        assert_eq!(
            test_map().projection(),
            vec!["Stripe Customer", "Amount", "Paid", "Currency"]
        );
    }

    #[test]
    fn test_projection_with_date() {
        let map = FieldMap {
            not_before: Some("Bill On".to_string()),
            ..test_map()
        };
        assert_eq!(map.projection().last().map(String::as_str), Some("Bill On"));
        assert!(!map.projection().contains(&"Notes".to_string()));
    }
}
