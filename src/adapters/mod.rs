//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum webhook endpoint
//! - `postgres` - User records and plan catalog
//! - `memory` - In-process record store and YAML plan catalog
//! - `stripe` - Billing provider REST client and mock
//! - `identity` - Identity provider group membership
//! - `notify` - Redis alerts and Resend email

pub mod http;
pub mod identity;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod stripe;
