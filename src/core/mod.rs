//! Core scheduler types.
//!
//! This module contains the data model shared by the runner and the
//! machines it drives:
//! - State identifiers via the [`StateId`] trait
//! - Per-state callback bundles ([`StateMapping`]) and their no-op
//!   defaults
//! - Tick phases and resumable routine primitives
//! - Immutable transition history

mod history;
mod mapping;
mod state;

pub use history::{TransitionHistory, TransitionRecord};
pub use mapping::{
    no_op_action, no_op_event, no_op_routine, Action, EventAction, Phase, Routine, RoutineFactory,
    RoutineStep, StateMapping,
};
pub use state::StateId;
