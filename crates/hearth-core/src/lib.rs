//! # hearth-core
//!
//! Shared building blocks for inspecting a Home Assistant recorder store:
//! record models, the error taxonomy, configuration, time window resolution,
//! filter specs, the as-of state contract and result normalization.
//! Storage and transport live in `hearth-storage` and `hearth-remote`.

pub mod as_of;
pub mod config;
pub mod errors;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod observability;
pub mod window;

pub use as_of::{AsOfIndex, AsOfLookup, AsOfRequest};
pub use config::HearthConfig;
pub use errors::{InspectError, InspectResult};
pub use filter::{FilterSpec, RowLimit};
pub use models::{EventRecord, LogbookEntry, StateRecord};
pub use window::{RangeSelector, TimeWindow};
