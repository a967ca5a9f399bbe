//! Table-backed resolver built from explicitly registered closures.

use crate::builder::error::BuildError;
use crate::core::{Phase, Routine, StateId};
use crate::resolver::{Binding, CallbackResolver, SlotName};
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// A [`CallbackResolver`] backed by a table of registered bindings.
///
/// The table is keyed by `(state, slot)`; anything not registered
/// resolves to [`Binding::Default`]. The actor argument is ignored;
/// this resolver binds per state, not per actor.
pub struct TableResolver<A, S: StateId> {
    bindings: HashMap<(S, SlotName), Binding<A>>,
}

impl<A, S: StateId> CallbackResolver<A, S> for TableResolver<A, S> {
    fn resolve(&self, _actor: &A, state: &S, slot: &SlotName) -> Binding<A> {
        self.bindings
            .get(&(state.clone(), slot.clone()))
            .cloned()
            .unwrap_or(Binding::Default)
    }
}

/// Builder for [`TableResolver`] with a fluent API.
///
/// # Example
///
/// ```rust
/// use stagehand::builder::ResolverBuilder;
/// use stagehand::state_id;
///
/// state_id! {
///     enum LightState {
///         Red,
///         Green,
///     }
/// }
///
/// struct Light {
///     crossings: u32,
/// }
///
/// let resolver = ResolverBuilder::<Light, LightState>::new()
///     .on_enter(LightState::Green, |light| light.crossings += 1)
///     .on_tick(LightState::Red, |_light| {})
///     .build()
///     .unwrap();
/// # let _ = resolver;
/// ```
pub struct ResolverBuilder<A, S: StateId> {
    bindings: HashMap<(S, SlotName), Binding<A>>,
    duplicates: Vec<(String, String)>,
    empty_event_state: Option<String>,
}

impl<A, S: StateId> ResolverBuilder<A, S> {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            duplicates: Vec::new(),
            empty_event_state: None,
        }
    }

    fn bind(mut self, state: S, slot: SlotName, binding: Binding<A>) -> Self {
        let label = (state.name().to_string(), slot.to_string());
        if self.bindings.insert((state, slot), binding).is_some() {
            self.duplicates.push(label);
        }
        self
    }

    /// Bind a synchronous enter callback.
    pub fn on_enter<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.bind(state, SlotName::Enter, Binding::Call(Rc::new(f)))
    }

    /// Bind a multi-tick enter routine. The factory is invoked each
    /// time the state is entered.
    pub fn on_enter_routine<F>(self, state: S, factory: F) -> Self
    where
        F: Fn() -> Routine<A> + 'static,
    {
        self.bind(state, SlotName::Enter, Binding::Routine(Rc::new(factory)))
    }

    /// Bind a synchronous exit callback.
    pub fn on_exit<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.bind(state, SlotName::Exit, Binding::Call(Rc::new(f)))
    }

    /// Bind a multi-tick exit routine.
    pub fn on_exit_routine<F>(self, state: S, factory: F) -> Self
    where
        F: Fn() -> Routine<A> + 'static,
    {
        self.bind(state, SlotName::Exit, Binding::Routine(Rc::new(factory)))
    }

    /// Bind the `finally` hook, run after exit completes.
    pub fn on_finally<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.bind(state, SlotName::Finally, Binding::Call(Rc::new(f)))
    }

    /// Bind the callback for an arbitrary phase.
    pub fn on_phase<F>(self, state: S, phase: Phase, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.bind(state, SlotName::Phase(phase), Binding::Call(Rc::new(f)))
    }

    /// Bind the early-tick phase callback.
    pub fn on_early_tick<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.on_phase(state, Phase::EarlyTick, f)
    }

    /// Bind the tick phase callback.
    pub fn on_tick<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.on_phase(state, Phase::Tick, f)
    }

    /// Bind the late-tick phase callback.
    pub fn on_late_tick<F>(self, state: S, f: F) -> Self
    where
        F: Fn(&mut A) + 'static,
    {
        self.on_phase(state, Phase::LateTick, f)
    }

    /// Bind a named event callback with an opaque payload.
    pub fn on_event<F>(mut self, state: S, name: &str, f: F) -> Self
    where
        F: Fn(&mut A, &dyn Any) + 'static,
    {
        if name.is_empty() {
            self.empty_event_state = Some(state.name().to_string());
            return self;
        }
        self.bind(
            state,
            SlotName::Event(name.to_string()),
            Binding::Event(Rc::new(f)),
        )
    }

    /// Build the resolver.
    /// Returns an error if any slot was bound twice.
    pub fn build(self) -> Result<TableResolver<A, S>, BuildError> {
        if let Some(state) = self.empty_event_state {
            return Err(BuildError::EmptyEventName { state });
        }
        if let Some((state, slot)) = self.duplicates.into_iter().next() {
            return Err(BuildError::DuplicateBinding { state, slot });
        }
        Ok(TableResolver {
            bindings: self.bindings,
        })
    }
}

impl<A, S: StateId> Default for ResolverBuilder<A, S> {
    fn default() -> Self {
        Self::new()
    }
}
