//! # hearth-storage
//!
//! Read-only access to a Home Assistant recorder database.
//! One shared connection (plus an optional reader pool), `query_only` PRAGMA,
//! catalog introspection, the tagged query builder, and as-of state lookups.

pub mod catalog;
pub mod pragmas;
pub mod queries;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use catalog::{Catalog, TableName};
pub use pragmas::configure_readonly_connection;
pub use queries::builder::{BuiltQuery, QueryShape};
pub use store::HistoryStore;

use hearth_core::InspectError;

/// Map a rusqlite failure into `QueryExecutionFailed` with a short context.
pub fn to_query_err(context: &'static str) -> impl Fn(rusqlite::Error) -> InspectError {
    move |e| InspectError::query_failed(context, e)
}
