//! Charging a customer's saved card exactly once.

use std::str::FromStr;

use payment_processor::{NewPaymentIntent, PaymentProcessor, ProcessorError, CARD};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

/// The only currency this system charges in.
pub const SUPPORTED_CURRENCY: &str = "usd";

/// Why a charge did not go through.
#[derive(Debug, Error)]
pub enum ChargeFailure {
    #[error("currency not supported")]
    UnsupportedCurrency(String),

    #[error("cannot charge 0 amount")]
    NonPositiveAmount,

    #[error("invalid amount {0}")]
    InvalidAmount(f64),

    #[error("unable to charge any payment method on file")]
    NoPaymentMethod,

    #[error("could not list payment methods: {0}")]
    ListPaymentMethods(#[source] ProcessorError),

    #[error("could not create payment intent: {0}")]
    CreateIntent(#[source] ProcessorError),

    #[error("could not confirm payment intent: {0}")]
    ConfirmIntent(#[source] ProcessorError),

    #[error("payment intent {intent_id} was not completed (status: {status})")]
    Incomplete { intent_id: String, status: String },
}

impl ChargeFailure {
    /// Whether the processor itself is unreachable or refusing us, as
    /// opposed to this particular charge being rejected.
    pub fn is_infrastructure(&self) -> bool {
        match self {
            ChargeFailure::ListPaymentMethods(e)
            | ChargeFailure::CreateIntent(e)
            | ChargeFailure::ConfirmIntent(e) => e.is_unavailable(),
            _ => false,
        }
    }
}

/// Result of one charge attempt.
#[derive(Debug)]
pub enum ChargeOutcome {
    Success { confirmation_id: String },
    Failure { reason: ChargeFailure },
}

impl ChargeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChargeOutcome::Success { .. })
    }
}

impl From<Result<String, ChargeFailure>> for ChargeOutcome {
    fn from(result: Result<String, ChargeFailure>) -> Self {
        match result {
            Ok(confirmation_id) => ChargeOutcome::Success { confirmation_id },
            Err(reason) => ChargeOutcome::Failure { reason },
        }
    }
}

/// Convert a major-unit amount to minor units (cents), truncating.
///
/// The conversion works on the shortest decimal form of the float, so
/// `19.99` becomes `1999` rather than `1998`.
pub fn to_minor_units(amount: f64) -> Result<i64, ChargeFailure> {
    if !amount.is_finite() {
        return Err(ChargeFailure::InvalidAmount(amount));
    }

    let major =
        Decimal::from_str(&amount.to_string()).map_err(|_| ChargeFailure::InvalidAmount(amount))?;
    let minor = major
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.trunc().to_i64())
        .ok_or(ChargeFailure::InvalidAmount(amount))?;

    if minor <= 0 {
        return Err(ChargeFailure::NonPositiveAmount);
    }
    Ok(minor)
}

/// Drives a single charge against a [`PaymentProcessor`].
pub struct Charger<P> {
    processor: P,
}

impl<P: PaymentProcessor> Charger<P> {
    pub fn new(processor: P) -> Self {
        Self { processor }
    }

    /// Get a reference to the processor.
    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Charge `amount` (major units) to the customer's first saved card.
    ///
    /// Validation failures return before any processor call. Only the first
    /// card the processor lists is tried. This moves real money and is not
    /// idempotent: call it at most once per record per cycle.
    pub async fn charge(&self, customer_id: &str, currency: &str, amount: f64) -> ChargeOutcome {
        self.try_charge(customer_id, currency, amount).await.into()
    }

    async fn try_charge(
        &self,
        customer_id: &str,
        currency: &str,
        amount: f64,
    ) -> Result<String, ChargeFailure> {
        let currency = currency.to_ascii_lowercase();
        if currency != SUPPORTED_CURRENCY {
            return Err(ChargeFailure::UnsupportedCurrency(currency));
        }
        let minor = to_minor_units(amount)?;

        let methods = self
            .processor
            .list_payment_methods(customer_id, CARD)
            .await
            .map_err(ChargeFailure::ListPaymentMethods)?;
        let method = methods.first().ok_or(ChargeFailure::NoPaymentMethod)?;
        debug!(
            "Charging {} {} to {} with {} ({} on file)",
            minor,
            currency,
            customer_id,
            method.id,
            methods.len()
        );

        let intent = self
            .processor
            .create_payment_intent(&NewPaymentIntent {
                amount: minor,
                currency: currency.clone(),
                customer: customer_id.to_string(),
                payment_method: method.id.clone(),
            })
            .await
            .map_err(ChargeFailure::CreateIntent)?;

        let confirmed = self
            .processor
            .confirm_payment_intent(&intent.id, &method.id)
            .await
            .map_err(ChargeFailure::ConfirmIntent)?;

        if !confirmed.is_completed() {
            return Err(ChargeFailure::Incomplete {
                intent_id: confirmed.id,
                status: confirmed.status,
            });
        }

        info!(
            "Charged {} {} to {} via {}: {}",
            minor,
            currency,
            customer_id,
            self.processor.name(),
            confirmed.id
        );
        Ok(confirmed.id)
    }
}
