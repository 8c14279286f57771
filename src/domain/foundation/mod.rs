//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and the error types that form the
//! vocabulary of the billing reconciler.

mod errors;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{DeliveryId, UserId};
pub use timestamp::{Timestamp, RECORD_FORMAT};
