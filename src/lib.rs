//! Billing Reconciler - Stripe webhook subscription reconciliation
//!
//! This crate receives signed Stripe webhooks and keeps each user's
//! subscription record, identity-provider access groups and notifications
//! consistent with the billing provider.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
