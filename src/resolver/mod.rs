//! The callback-resolver seam.
//!
//! The scheduler never discovers behavior by naming convention itself;
//! it consumes a [`CallbackResolver`] that, given an actor and a state
//! identifier, produces the callback bound to each slot, or
//! [`Binding::Default`] to fall back to the shared no-op. A machine
//! queries the resolver once per state (and once per event name) and
//! caches the result in its mapping table.

use crate::core::{Action, EventAction, Phase, RoutineFactory, StateId};
use std::fmt;

/// Names one callback slot of a state's mapping.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum SlotName {
    /// Lifecycle hook invoked when the state is entered.
    Enter,
    /// Lifecycle hook invoked when the state is exited.
    Exit,
    /// Synchronous hook invoked after exit completes, before the new
    /// mapping takes over.
    Finally,
    /// One of the three per-tick phase callbacks.
    Phase(Phase),
    /// A named event callback with an opaque payload.
    Event(String),
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enter => f.write_str("enter"),
            Self::Exit => f.write_str("exit"),
            Self::Finally => f.write_str("finally"),
            Self::Phase(phase) => f.write_str(phase.name()),
            Self::Event(name) => write!(f, "event:{name}"),
        }
    }
}

/// A resolved callback for one slot.
pub enum Binding<A> {
    /// A synchronous callback.
    Call(Action<A>),
    /// A resumable routine spanning multiple scheduler ticks. Only
    /// meaningful for the `Enter` and `Exit` slots.
    Routine(RoutineFactory<A>),
    /// An event callback. Only meaningful for `Event` slots.
    Event(EventAction<A>),
    /// Nothing bound; the mapping keeps its no-op default.
    Default,
}

impl<A> Clone for Binding<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Call(action) => Self::Call(action.clone()),
            Self::Routine(factory) => Self::Routine(factory.clone()),
            Self::Event(action) => Self::Event(action.clone()),
            Self::Default => Self::Default,
        }
    }
}

impl<A> Binding<A> {
    /// Short label for log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Call(_) => "call",
            Self::Routine(_) => "routine",
            Self::Event(_) => "event",
            Self::Default => "default",
        }
    }
}

/// Resolves the callback bound to a slot for a given actor and state.
///
/// Implementations own whatever binding scheme the host uses: a
/// registration table, generated code, anything. The scheduler only
/// requires this contract and performs the lookup once per
/// `(state, slot)` pair.
pub trait CallbackResolver<A, S: StateId> {
    /// Return the best-match callback for `slot`, or
    /// [`Binding::Default`] if the actor exposes none.
    fn resolve(&self, actor: &A, state: &S, slot: &SlotName) -> Binding<A>;
}

/// Resolver that binds nothing: every state keeps its no-op defaults.
///
/// Useful for tests and for machines whose transitions are driven
/// entirely by the host.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullResolver;

impl<A, S: StateId> CallbackResolver<A, S> for NullResolver {
    fn resolve(&self, _actor: &A, _state: &S, _slot: &SlotName) -> Binding<A> {
        Binding::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
    enum TestState {
        A,
    }

    impl StateId for TestState {
        fn name(&self) -> &str {
            "A"
        }
    }

    #[test]
    fn null_resolver_defaults_every_slot() {
        let resolver = NullResolver;
        let actor = ();

        for slot in [
            SlotName::Enter,
            SlotName::Exit,
            SlotName::Finally,
            SlotName::Phase(Phase::EarlyTick),
            SlotName::Phase(Phase::Tick),
            SlotName::Phase(Phase::LateTick),
            SlotName::Event("collision".to_string()),
        ] {
            let binding: Binding<()> =
                CallbackResolver::<(), TestState>::resolve(&resolver, &actor, &TestState::A, &slot);
            assert_eq!(binding.kind(), "default");
        }
    }

    #[test]
    fn slot_names_display_for_logging() {
        assert_eq!(SlotName::Enter.to_string(), "enter");
        assert_eq!(SlotName::Phase(Phase::Tick).to_string(), "tick");
        assert_eq!(
            SlotName::Event("collision".to_string()).to_string(),
            "event:collision"
        );
    }
}
