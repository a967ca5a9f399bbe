//! The transition protocol's cursor and errors.
//!
//! A transition is itself a small state machine: exit the old mapping,
//! run its `finally` hook, resolve the destination mapping, enter it.
//! Synchronous stages fall through in a single advance; an asynchronous
//! exit or enter routine suspends the cursor until the next scheduler
//! tick. The cursor lives on the machine for exactly the span where
//! `is_in_transition` is true.

use crate::core::{Routine, StateId, StateMapping};
use std::rc::Rc;
use thiserror::Error;

/// Errors produced by the transition protocol.
#[derive(Debug, Error)]
pub enum TransitionError {
    /// `change_state` was called while a transition was already in
    /// flight. The request is rejected; the in-flight transition is
    /// unaffected.
    #[error("Transition to '{to}' rejected: another transition is already in flight")]
    AlreadyTransitioning { to: String },
}

/// Where the cursor currently is within the protocol.
pub(crate) enum Stage<A> {
    /// Start exiting the old mapping (or skip ahead if there is none).
    BeginExit,
    /// An asynchronous exit routine in flight; polled once per tick.
    ExitRoutine(Routine<A>),
    /// Run the old mapping's `finally` hook.
    Finalize,
    /// Resolve and cache the destination mapping.
    Assign,
    /// Start entering the destination mapping.
    BeginEnter,
    /// An asynchronous enter routine in flight; polled once per tick.
    EnterRoutine(Routine<A>),
    /// Flip the machine's observable state to the destination.
    Complete,
}

/// In-flight transition state.
///
/// `stage` is taken out while a step executes so user callbacks run
/// without the machine borrowed; re-entrant `change_state` calls still
/// observe `is_in_transition` through the cursor's presence.
pub(crate) struct TransitionSeq<A, S: StateId> {
    /// Destination state.
    pub(crate) to: S,
    /// Mapping being exited; `None` on a machine's first transition.
    pub(crate) old_mapping: Option<Rc<StateMapping<A>>>,
    /// Destination mapping, filled in at the `Assign` stage.
    pub(crate) dest_mapping: Option<Rc<StateMapping<A>>>,
    pub(crate) stage: Option<Stage<A>>,
}

impl<A, S: StateId> TransitionSeq<A, S> {
    pub(crate) fn new(to: S, old_mapping: Option<Rc<StateMapping<A>>>) -> Self {
        Self {
            to,
            old_mapping,
            dest_mapping: None,
            stage: Some(Stage::BeginExit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        A,
        B,
    }

    impl StateId for TestState {
        fn name(&self) -> &str {
            match self {
                Self::A => "A",
                Self::B => "B",
            }
        }
    }

    #[test]
    fn new_cursor_starts_at_exit() {
        let seq: TransitionSeq<(), TestState> = TransitionSeq::new(TestState::B, None);
        assert!(matches!(seq.stage, Some(Stage::BeginExit)));
        assert!(seq.dest_mapping.is_none());
        assert_eq!(seq.to, TestState::B);
    }

    #[test]
    fn error_names_the_rejected_destination() {
        let err = TransitionError::AlreadyTransitioning {
            to: "B".to_string(),
        };
        assert!(err.to_string().contains("'B'"));
    }
}
