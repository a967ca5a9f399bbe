//! Build errors for resolver-table construction.

use thiserror::Error;

/// Errors that can occur when building a binding table.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Slot '{slot}' is already bound for state '{state}'")]
    DuplicateBinding { state: String, slot: String },

    #[error("Event name must not be empty (state '{state}')")]
    EmptyEventName { state: String },
}
