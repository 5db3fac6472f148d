//! The PaymentProcessor trait definition.

use async_trait::async_trait;

use crate::error::ProcessorError;
use crate::types::{NewPaymentIntent, PaymentIntent, PaymentMethod};

/// The charge operations the reconciliation loop needs from a processor.
///
/// This trait is object-safe and can be used with `Box<dyn PaymentProcessor>`.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// List the customer's saved payment methods of the given type, in the
    /// processor's own order.
    async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError>;

    /// Create an unconfirmed payment intent.
    async fn create_payment_intent(
        &self,
        params: &NewPaymentIntent,
    ) -> Result<PaymentIntent, ProcessorError>;

    /// Confirm a payment intent with the given payment method. This is the
    /// step that moves money.
    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentIntent, ProcessorError>;

    /// Get a human-readable name for this processor.
    fn name(&self) -> &str;
}
