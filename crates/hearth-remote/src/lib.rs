//! # hearth-remote
//!
//! Thin adapter over the live system's REST API: logbook entries for a
//! window, and the current state listing with a per-domain size summary.
//! Filtering and ordering of logbook entries happen in `hearth-logbook`.

pub mod client;
pub mod entry;
pub mod states;

pub use client::{resolve_remote_window, RemoteClient};
pub use entry::{parse_logbook, RemoteInstant, RemoteLogbookEntry};
pub use states::{parse_states, DomainSummary, RemoteState, StateListing};
