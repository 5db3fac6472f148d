//! Stripe API request and response types.

use serde::{Deserialize, Serialize};

/// Payment method type used for saved cards.
pub const CARD: &str = "card";

/// A saved payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    /// Identifier, e.g. "pm_...".
    pub id: String,
    /// Method type, e.g. "card".
    #[serde(rename = "type", default)]
    pub method_type: String,
    /// Card details when `method_type` is "card".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<CardDetails>,
}

impl PaymentMethod {
    /// A card payment method with no details.
    pub fn card(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            method_type: CARD.to_string(),
            card: None,
        }
    }
}

/// Non-sensitive card details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetails {
    pub brand: Option<String>,
    pub last4: Option<String>,
}

/// A page of payment methods, in the order the processor returns them.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PaymentMethodList {
    pub data: Vec<PaymentMethod>,
}

/// Parameters for creating a payment intent.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentIntent {
    /// Amount in minor currency units.
    pub amount: i64,
    /// Lower-case ISO currency code.
    pub currency: String,
    /// Customer to charge.
    pub customer: String,
    /// Saved payment method to use.
    pub payment_method: String,
}

impl NewPaymentIntent {
    /// Encode as form fields.
    pub(crate) fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("amount", self.amount.to_string()),
            ("currency", self.currency.clone()),
            ("customer", self.customer.clone()),
            ("payment_method", self.payment_method.clone()),
        ]
    }
}

/// A payment intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Identifier, e.g. "pi_...".
    pub id: String,
    /// Lifecycle status, e.g. "requires_confirmation" or "succeeded".
    #[serde(default)]
    pub status: String,
    /// Amount in minor units.
    #[serde(default)]
    pub amount: i64,
    /// Currency code.
    #[serde(default)]
    pub currency: String,
}

impl PaymentIntent {
    /// Whether confirmation left the intent in a state where money moves
    /// without further customer action.
    pub fn is_completed(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "processing")
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_payment_method_list() {
        let list: PaymentMethodList = serde_json::from_value(json!({
            "object": "list",
            "data": [
                {"id": "pm_1", "type": "card", "card": {"brand": "visa", "last4": "4242"}},
                {"id": "pm_2", "type": "card"}
            ],
            "has_more": false
        }))
        .unwrap();

        assert_eq!(list.data.len(), 2);
        assert_eq!(list.data[0].id, "pm_1");
        assert_eq!(
            list.data[0].card.as_ref().and_then(|c| c.last4.as_deref()),
            Some("4242")
        );
        assert!(list.data[1].card.is_none());
    }

    #[test]
    fn test_new_intent_form_fields() {
        let params = NewPaymentIntent {
            amount: 1999,
            currency: "usd".to_string(),
            customer: "cus_123".to_string(),
            payment_method: "pm_1".to_string(),
        };

        assert_eq!(
            params.form(),
            vec![
                ("amount", "1999".to_string()),
                ("currency", "usd".to_string()),
                ("customer", "cus_123".to_string()),
                ("payment_method", "pm_1".to_string()),
            ]
        );
    }

    #[test]
    fn test_intent_completion() {
        let mut intent = PaymentIntent {
            id: "pi_1".to_string(),
            status: "succeeded".to_string(),
            amount: 100,
            currency: "usd".to_string(),
        };
        assert!(intent.is_completed());

        intent.status = "requires_action".to_string();
        assert!(!intent.is_completed());
    }
}
