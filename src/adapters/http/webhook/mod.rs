//! HTTP adapter for the billing webhook.
//!
//! - `POST /payment/webhook` - Verify and reconcile a Stripe event
//! - `GET /health` - Liveness

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, WebhookAck};
pub use handlers::{WebhookApiError, WebhookAppState, STRIPE_SIGNATURE_HEADER};
pub use routes::webhook_router;
