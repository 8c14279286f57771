//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `UserRecordStore` - Per-user subscription records
//! - `PlanCatalog` - Price id to plan group mapping
//!
//! ## External Service Ports
//!
//! - `BillingProvider` - Subscription, payment method and invoice lookups
//! - `IdentityGroups` - Access group membership in the identity provider
//! - `AlertPublisher` - Operational alerts per delivery
//! - `EmailSender` - Templated confirmation emails

mod alert_publisher;
mod billing_provider;
mod email_sender;
mod identity_groups;
mod plan_catalog;
mod user_record_store;

pub use alert_publisher::{
    AlertPublisher, SUBJECT_EXCEPTION, SUBJECT_SIGNATURE_ERROR, SUBJECT_SUBSCRIPTION_DELETED,
    SUBJECT_SUCCESS,
};
pub use billing_provider::{
    BillingProvider, BillingProviderError, BillingProviderErrorCode, ProviderInvoice,
    ProviderSubscription,
};
pub use email_sender::{EmailSender, TemplatedEmail, SUBSCRIPTION_CONFIRMATION_TEMPLATE};
pub use identity_groups::{IdentityError, IdentityGroups};
pub use plan_catalog::PlanCatalog;
pub use user_record_store::UserRecordStore;
