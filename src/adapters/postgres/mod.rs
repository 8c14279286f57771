//! PostgreSQL adapters - Database implementations for storage ports.
//!
//! - `PostgresUserRecordStore` - `users` table, indexed by customer id and lower(email)
//! - `PostgresPlanCatalog` - `plans` table, indexed by lower(stripe_price_id)

mod plan_catalog;
mod user_record_store;

pub use plan_catalog::PostgresPlanCatalog;
pub use user_record_store::PostgresUserRecordStore;
