//! HTTP adapters - REST API implementations.

pub mod webhook;

use axum::Router;
use tower_http::trace::TraceLayer;

pub use webhook::{webhook_router, WebhookAppState};

/// Full application router with request tracing.
///
/// Delivery deadlines are enforced by the webhook handler, so a timed-out
/// delivery still reports its failure.
pub fn app_router(state: WebhookAppState) -> Router {
    webhook_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
