//! HTTP handlers for the billing webhook endpoints.
//!
//! These handlers connect Axum routes to the application layer handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Json, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, Notifier,
    ReconcileSubscriptionHandler, UserLocks,
};
use crate::domain::billing::{ReconcileError, ReconcilePolicy, StripeWebhookVerifier};
use crate::ports::{BillingProvider, IdentityGroups, PlanCatalog, UserRecordStore};

use super::dto::{ErrorResponse, HealthResponse, WebhookAck};

pub const STRIPE_SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; handlers are built on demand from the Arc-wrapped ports.
#[derive(Clone)]
pub struct WebhookAppState {
    pub user_store: Arc<dyn UserRecordStore>,
    pub plan_catalog: Arc<dyn PlanCatalog>,
    pub billing_provider: Arc<dyn BillingProvider>,
    pub identity_groups: Arc<dyn IdentityGroups>,
    pub notifier: Arc<Notifier>,
    pub verifier: Arc<StripeWebhookVerifier>,
    pub policy: ReconcilePolicy,
    pub user_locks: Arc<UserLocks>,
    /// Deadline for one delivery; exceeding it fails and alerts like any error.
    pub processing_timeout: Duration,
}

impl WebhookAppState {
    pub fn reconcile_handler(&self) -> ReconcileSubscriptionHandler {
        ReconcileSubscriptionHandler::new(
            self.user_store.clone(),
            self.billing_provider.clone(),
            self.plan_catalog.clone(),
            self.identity_groups.clone(),
            self.notifier.clone(),
            self.policy,
            self.user_locks.clone(),
        )
    }

    pub fn webhook_handler(&self) -> HandleBillingWebhookHandler {
        HandleBillingWebhookHandler::new(
            self.verifier.clone(),
            self.reconcile_handler(),
            self.notifier.clone(),
        )
        .with_deadline(self.processing_timeout)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /payment/webhook - Handle Stripe webhook events
pub async fn handle_stripe_webhook(
    State(state): State<WebhookAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandleBillingWebhookCommand {
        payload: body.to_vec(),
        signature,
    };
    let result = state.webhook_handler().handle(cmd).await?;

    Ok((StatusCode::OK, Json(WebhookAck::from(result))))
}

/// GET /health - Liveness probe
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts reconcile errors to HTTP responses.
#[derive(Debug)]
pub struct WebhookApiError(ReconcileError);

impl From<ReconcileError> for WebhookApiError {
    fn from(err: ReconcileError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let error_code = match &self.0 {
            ReconcileError::Authenticity(_) => "INVALID_WEBHOOK_SIGNATURE",
            ReconcileError::UnresolvedPlan { .. } => "UNRESOLVED_PLAN",
            ReconcileError::RecordNotFound { .. } => "RECORD_NOT_FOUND",
            ReconcileError::InvalidPayload { .. } => "INVALID_PAYLOAD",
            ReconcileError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
        };

        let body = ErrorResponse::new(error_code, self.0.to_string());
        (self.0.status_code(), Json(body)).into_response()
    }
}
