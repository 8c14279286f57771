//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors)
//! - `billing` - Stripe events, subscription records and reconciliation rules

pub mod billing;
pub mod foundation;
