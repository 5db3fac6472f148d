//! Scripted payment processor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use payment_processor::{
    NewPaymentIntent, PaymentIntent, PaymentMethod, PaymentProcessor, ProcessorError,
};

/// A call received by `ScriptedProcessor`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorCall {
    ListPaymentMethods { customer: String, method_type: String },
    CreatePaymentIntent(NewPaymentIntent),
    ConfirmPaymentIntent { intent: String, payment_method: String },
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<ProcessorCall>,
    next_intent: u32,
}

/// A processor that never moves money.
///
/// Customers and their cards are configured up front; every call is
/// recorded so tests can assert on exactly which steps ran. Clones share
/// the call log.
#[derive(Debug, Default, Clone)]
pub struct ScriptedProcessor {
    methods: HashMap<String, Vec<PaymentMethod>>,
    failing_lists: Vec<String>,
    unavailable: bool,
    decline_create: Option<String>,
    decline_confirm: Option<String>,
    confirm_status: Option<String>,
    state: Arc<Mutex<State>>,
}

impl ScriptedProcessor {
    /// Create a processor with no customers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a card to a customer. Cards are listed in insertion order.
    pub fn with_card(mut self, customer: impl Into<String>, method_id: impl Into<String>) -> Self {
        self.methods
            .entry(customer.into())
            .or_default()
            .push(PaymentMethod::card(method_id));
        self
    }

    /// Make listing payment methods fail for a customer.
    pub fn with_failing_list(mut self, customer: impl Into<String>) -> Self {
        self.failing_lists.push(customer.into());
        self
    }

    /// Make every call fail as if the processor were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Make every intent creation fail with the given message.
    pub fn declining_create(mut self, message: impl Into<String>) -> Self {
        self.decline_create = Some(message.into());
        self
    }

    /// Make every confirmation fail with the given message.
    pub fn declining_confirm(mut self, message: impl Into<String>) -> Self {
        self.decline_confirm = Some(message.into());
        self
    }

    /// Status reported by confirmations (default: "succeeded").
    pub fn with_confirm_status(mut self, status: impl Into<String>) -> Self {
        self.confirm_status = Some(status.into());
        self
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<ProcessorCall> {
        self.lock().calls.clone()
    }

    /// Intents that were created.
    pub fn created_intents(&self) -> Vec<NewPaymentIntent> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                ProcessorCall::CreatePaymentIntent(params) => Some(params.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of confirmations attempted.
    pub fn confirm_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ProcessorCall::ConfirmPaymentIntent { .. }))
            .count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_available(&self) -> Result<(), ProcessorError> {
        if self.unavailable {
            return Err(ProcessorError::Api {
                status: 503,
                kind: Some("api_error".to_string()),
                code: None,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn card_declined(message: &str) -> ProcessorError {
        ProcessorError::Api {
            status: 402,
            kind: Some("card_error".to_string()),
            code: Some("card_declined".to_string()),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl PaymentProcessor for ScriptedProcessor {
    async fn list_payment_methods(
        &self,
        customer_id: &str,
        method_type: &str,
    ) -> Result<Vec<PaymentMethod>, ProcessorError> {
        self.lock().calls.push(ProcessorCall::ListPaymentMethods {
            customer: customer_id.to_string(),
            method_type: method_type.to_string(),
        });
        self.check_available()?;

        if self.failing_lists.iter().any(|c| c == customer_id) {
            return Err(ProcessorError::Api {
                status: 404,
                kind: Some("invalid_request_error".to_string()),
                code: Some("resource_missing".to_string()),
                message: format!("No such customer: '{}'", customer_id),
            });
        }

        Ok(self
            .methods
            .get(customer_id)
            .map(|methods| {
                methods
                    .iter()
                    .filter(|m| m.method_type == method_type)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create_payment_intent(
        &self,
        params: &NewPaymentIntent,
    ) -> Result<PaymentIntent, ProcessorError> {
        let mut state = self.lock();
        state
            .calls
            .push(ProcessorCall::CreatePaymentIntent(params.clone()));
        self.check_available()?;

        if let Some(message) = &self.decline_create {
            return Err(Self::card_declined(message));
        }

        state.next_intent += 1;
        Ok(PaymentIntent {
            id: format!("pi_mock_{}", state.next_intent),
            status: "requires_confirmation".to_string(),
            amount: params.amount,
            currency: params.currency.clone(),
        })
    }

    async fn confirm_payment_intent(
        &self,
        intent_id: &str,
        payment_method_id: &str,
    ) -> Result<PaymentIntent, ProcessorError> {
        self.lock().calls.push(ProcessorCall::ConfirmPaymentIntent {
            intent: intent_id.to_string(),
            payment_method: payment_method_id.to_string(),
        });
        self.check_available()?;

        if let Some(message) = &self.decline_confirm {
            return Err(Self::card_declined(message));
        }

        Ok(PaymentIntent {
            id: intent_id.to_string(),
            status: self
                .confirm_status
                .clone()
                .unwrap_or_else(|| "succeeded".to_string()),
            amount: 0,
            currency: String::new(),
        })
    }

    fn name(&self) -> &str {
        "ScriptedProcessor"
    }
}
