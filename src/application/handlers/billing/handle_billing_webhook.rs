//! HandleBillingWebhookHandler - Entry point for one inbound webhook delivery.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::billing::{BillingEvent, ReconcileError, StripeWebhookVerifier, Transition};
use crate::domain::foundation::DeliveryId;

use super::notifications::Notifier;
use super::reconcile_subscription::{ReconcileSubscriptionCommand, ReconcileSubscriptionHandler};

/// Command to handle a raw webhook delivery.
#[derive(Debug, Clone)]
pub struct HandleBillingWebhookCommand {
    /// Raw request body, exactly as signed.
    pub payload: Vec<u8>,
    /// `Stripe-Signature` header, if present.
    pub signature: Option<String>,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq)]
pub enum HandleBillingWebhookResult {
    /// Event applied to a user record.
    Reconciled {
        event_id: String,
        event_type: String,
        transition: Transition,
    },
    /// Event type this service does not reconcile.
    Ignored { event_id: String, event_type: String },
}

/// Handler for Stripe billing webhooks.
///
/// Verifies authenticity, classifies the event and dispatches it. Any
/// failure, including an exceeded deadline, publishes one alert before it
/// is returned.
pub struct HandleBillingWebhookHandler {
    verifier: Arc<StripeWebhookVerifier>,
    reconcile: ReconcileSubscriptionHandler,
    notifier: Arc<Notifier>,
    deadline: Option<Duration>,
}

impl HandleBillingWebhookHandler {
    pub fn new(
        verifier: Arc<StripeWebhookVerifier>,
        reconcile: ReconcileSubscriptionHandler,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            verifier,
            reconcile,
            notifier,
            deadline: None,
        }
    }

    /// Bounds verification plus reconciliation of one delivery.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub async fn handle(
        &self,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<HandleBillingWebhookResult, ReconcileError> {
        let delivery_id = DeliveryId::new();

        let outcome = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.process(delivery_id, cmd))
                .await
                .unwrap_or_else(|_| {
                    Err(ReconcileError::external(
                        "webhook processing",
                        format!("no outcome within {:?}", deadline),
                    ))
                }),
            None => self.process(delivery_id, cmd).await,
        };

        match outcome {
            Ok(result) => Ok(result),
            Err(err) => {
                let chain = error_chain(&err);
                tracing::error!(
                    delivery_id = %delivery_id,
                    retryable = err.is_retryable(),
                    error = %chain,
                    "Webhook delivery failed"
                );
                self.notifier
                    .alert(
                        self.notifier.subjects().for_failure(&err),
                        &format!("Webhook delivery {} failed: {}", delivery_id, chain),
                    )
                    .await;
                Err(err)
            }
        }
    }

    async fn process(
        &self,
        delivery_id: DeliveryId,
        cmd: HandleBillingWebhookCommand,
    ) -> Result<HandleBillingWebhookResult, ReconcileError> {
        // 1. Verify signature and parse envelope
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())?;

        tracing::info!(
            delivery_id = %delivery_id,
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Webhook event received"
        );

        // 2. Validate into a typed event
        let billing_event = BillingEvent::from_stripe(&event)?;

        // 3. Dispatch
        if let BillingEvent::Unhandled { event_type } = &billing_event {
            tracing::info!(event_id = %event.id, event_type = %event_type, "Ignoring unhandled event type");
            return Ok(HandleBillingWebhookResult::Ignored {
                event_id: event.id,
                event_type: event_type.clone(),
            });
        }

        let event_type = billing_event.event_type().to_string();
        let result = self
            .reconcile
            .handle(ReconcileSubscriptionCommand {
                event_id: event.id.clone(),
                event: billing_event,
            })
            .await?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event_type,
            user_id = %result.user_id,
            transition = ?result.transition,
            "Webhook event reconciled"
        );

        Ok(HandleBillingWebhookResult::Reconciled {
            event_id: event.id,
            event_type,
            transition: result.transition,
        })
    }
}

/// Renders an error with its sources, outermost first.
///
/// Sources already spelled out by their parent's message are skipped.
fn error_chain(err: &dyn StdError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !rendered.ends_with(&text) {
            rendered.push_str(": ");
            rendered.push_str(&text);
        }
        source = cause.source();
    }
    rendered
}
