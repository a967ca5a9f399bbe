//! Builder API for registering callback bindings.
//!
//! Hosts that do not bring their own [`CallbackResolver`] implementation
//! can register closures per `(state, slot)` with [`ResolverBuilder`]
//! and hand the resulting [`TableResolver`] to the runner.
//!
//! [`CallbackResolver`]: crate::resolver::CallbackResolver

pub mod error;
pub mod macros;
pub mod table;

pub use error::BuildError;
pub use table::{ResolverBuilder, TableResolver};
