//! SQL for the recorder schema: the tagged query builder, row reading,
//! logbook event fetches and as-of state slices.

pub mod as_of;
pub mod builder;
pub mod events;
pub mod rows;
