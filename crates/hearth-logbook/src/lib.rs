//! # hearth-logbook
//!
//! Builds the human-readable logbook: each event paired with the state its
//! entity was in when the event fired, with unavailable and excluded entries
//! dropped and everything ordered newest first in the reference timezone.
//!
//! Entries come either from the recorder store or from the live system's
//! logbook API; both go through the same post-processing.

pub mod engine;
pub mod reconstruct;

pub use engine::LogbookEngine;
pub use reconstruct::{entry_from_event, entry_from_remote, finalize, reconstruct};
