//! Mock billing provider for testing.
//!
//! Provides a configurable mock implementation of `BillingProvider` for unit
//! and integration tests. Supports:
//! - Pre-configured subscriptions, payment methods and invoices
//! - Error injection per method
//! - Call tracking

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::PaymentMethodSummary;
use crate::ports::{BillingProvider, BillingProviderError, ProviderInvoice, ProviderSubscription};

/// Mock billing provider for testing.
///
/// # Example
///
/// ```ignore
/// let mock = MockBillingProvider::new();
/// mock.add_subscription(ProviderSubscription { id: "sub_1".into(), ..Default::default() });
/// mock.set_method_error("retrieve_invoice", BillingProviderError::network("timeout"));
/// ```
#[derive(Default, Clone)]
pub struct MockBillingProvider {
    /// Inner state (thread-safe for async tests).
    inner: Arc<Mutex<MockState>>,
}

/// Internal mutable state.
#[derive(Default)]
struct MockState {
    subscriptions: HashMap<String, ProviderSubscription>,
    payment_methods: HashMap<String, PaymentMethodSummary>,
    invoices: HashMap<String, ProviderInvoice>,

    /// Specific errors by method name.
    method_errors: HashMap<String, BillingProviderError>,

    /// Track method calls for assertions.
    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: String,
    pub args: Vec<String>,
}

impl MockBillingProvider {
    /// Create a new mock provider with no objects.
    pub fn new() -> Self {
        Self::default()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration Methods
    // ════════════════════════════════════════════════════════════════════════════

    pub fn add_subscription(&self, subscription: ProviderSubscription) {
        let id = subscription.id.clone();
        self.state().subscriptions.insert(id, subscription);
    }

    pub fn add_payment_method(&self, id: impl Into<String>, summary: PaymentMethodSummary) {
        self.state().payment_methods.insert(id.into(), summary);
    }

    pub fn add_invoice(&self, invoice: ProviderInvoice) {
        let id = invoice.id.clone();
        self.state().invoices.insert(id, invoice);
    }

    /// Set an error for a specific method.
    pub fn set_method_error(&self, method: &str, error: BillingProviderError) {
        self.state().method_errors.insert(method.to_string(), error);
    }

    /// Clear all configured errors.
    pub fn clear_errors(&self) {
        self.state().method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Call Tracking
    // ════════════════════════════════════════════════════════════════════════════

    /// Get all recorded method calls.
    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    /// Get count of calls to a method.
    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Internal Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records the call and returns the injected error, if any.
    fn enter(&self, method: &str, arg: &str) -> Result<(), BillingProviderError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method: method.to_string(),
            args: vec![arg.to_string()],
        });

        match state.method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BillingProvider for MockBillingProvider {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, BillingProviderError> {
        self.enter("retrieve_subscription", subscription_id)?;
        Ok(self.state().subscriptions.get(subscription_id).cloned())
    }

    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethodSummary>, BillingProviderError> {
        self.enter("retrieve_payment_method", payment_method_id)?;
        Ok(self.state().payment_methods.get(payment_method_id).cloned())
    }

    async fn retrieve_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Option<ProviderInvoice>, BillingProviderError> {
        self.enter("retrieve_invoice", invoice_id)?;
        Ok(self.state().invoices.get(invoice_id).cloned())
    }
}
