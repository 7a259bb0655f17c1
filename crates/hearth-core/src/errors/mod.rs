mod inspect_error;

pub use inspect_error::{InspectError, InspectResult};
