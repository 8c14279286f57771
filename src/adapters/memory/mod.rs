//! In-process storage adapters.
//!
//! - `InMemoryUserRecordStore` - Indexed map of user records
//! - `StaticPlanCatalog` - Plan list, optionally loaded from YAML

mod in_memory_user_store;
mod yaml_plan_catalog;

pub use in_memory_user_store::InMemoryUserRecordStore;
pub use yaml_plan_catalog::StaticPlanCatalog;
