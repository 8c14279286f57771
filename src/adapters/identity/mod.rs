//! Identity provider group adapters.
//!
//! - `HttpIdentityGroups` - Admin REST API client (reqwest)
//! - `InMemoryIdentityGroups` - Map-backed implementation with a call log

mod http_identity_groups;
mod in_memory_identity_groups;

pub use http_identity_groups::{HttpIdentityGroups, IdentityAdminConfig};
pub use in_memory_identity_groups::{GroupCall, InMemoryIdentityGroups};
