//! Per-state callback bundles and their no-op defaults.
//!
//! A [`StateMapping`] holds every callback bound to one state identifier
//! for one machine: the enter/exit lifecycle pair (either synchronous
//! calls or multi-tick routines), the `finally` hook, the three phase
//! callbacks, and any named event callbacks. Every slot defaults to a
//! shared no-op, so a state with no bound behavior is always safe to
//! dispatch into.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One of the three ordered update phases within a scheduler tick.
///
/// The runner completes a phase across every registered instance before
/// starting the next, in the fixed order `EarlyTick` → `Tick` →
/// `LateTick`. In-flight transitions are progressed during the `Tick`
/// phase only.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Phase {
    /// First phase of the tick.
    EarlyTick,
    /// Main phase of the tick; also drives transition progression.
    Tick,
    /// Last phase of the tick.
    LateTick,
}

impl Phase {
    /// All phases in scheduler dispatch order.
    pub const ORDERED: [Phase; 3] = [Phase::EarlyTick, Phase::Tick, Phase::LateTick];

    /// Get the phase's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::EarlyTick => "early_tick",
            Self::Tick => "tick",
            Self::LateTick => "late_tick",
        }
    }
}

/// Outcome of polling a resumable enter/exit routine once.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RoutineStep {
    /// The routine suspended; poll it again on the next scheduler tick.
    Yield,
    /// The routine finished.
    Done,
}

/// Synchronous callback invoked with mutable access to the actor.
pub type Action<A> = Rc<dyn Fn(&mut A)>;

/// A resumable enter/exit sequence, polled once per scheduler tick.
///
/// Each poll runs the routine until it either suspends
/// ([`RoutineStep::Yield`]) or completes ([`RoutineStep::Done`]).
pub type Routine<A> = Box<dyn FnMut(&mut A) -> RoutineStep>;

/// Factory producing a fresh [`Routine`] each time a transition needs
/// one. Stored rather than the routine itself so a state can be entered
/// and exited any number of times.
pub type RoutineFactory<A> = Rc<dyn Fn() -> Routine<A>>;

/// Event callback with an opaque, host-defined payload.
pub type EventAction<A> = Rc<dyn Fn(&mut A, &dyn Any)>;

/// Shared no-op for synchronous callback slots.
pub fn no_op_action<A>() -> Action<A> {
    Rc::new(|_actor| {})
}

/// Shared no-op routine factory: completes on its first poll.
pub fn no_op_routine<A>() -> RoutineFactory<A> {
    Rc::new(|| Box::new(|_actor: &mut A| RoutineStep::Done) as Routine<A>)
}

/// Shared no-op for event callback slots.
pub fn no_op_event<A>() -> EventAction<A> {
    Rc::new(|_actor, _payload| {})
}

/// The bundle of callbacks bound to one state identifier.
///
/// Mappings are created lazily, the first time a machine transitions
/// into (or out of) a state, and cached in the machine's mapping table
/// afterwards. All slots start as no-ops and are overwritten with
/// whatever the resolver binds.
pub struct StateMapping<A> {
    has_enter_routine: bool,
    pub(crate) enter_call: Action<A>,
    pub(crate) enter_routine: RoutineFactory<A>,

    has_exit_routine: bool,
    pub(crate) exit_call: Action<A>,
    pub(crate) exit_routine: RoutineFactory<A>,

    pub(crate) finally_call: Action<A>,

    early_tick: Action<A>,
    tick: Action<A>,
    late_tick: Action<A>,

    // Event bindings resolve on first raise, not at mapping creation,
    // since event names form an open set.
    events: RefCell<HashMap<String, EventAction<A>>>,
}

impl<A> StateMapping<A> {
    /// Create a mapping with every slot set to the no-op default.
    pub fn no_op() -> Self {
        Self {
            has_enter_routine: false,
            enter_call: no_op_action(),
            enter_routine: no_op_routine(),
            has_exit_routine: false,
            exit_call: no_op_action(),
            exit_routine: no_op_routine(),
            finally_call: no_op_action(),
            early_tick: no_op_action(),
            tick: no_op_action(),
            late_tick: no_op_action(),
            events: RefCell::new(HashMap::new()),
        }
    }

    /// Whether the bound enter is a multi-tick routine rather than a
    /// synchronous call.
    pub fn has_enter_routine(&self) -> bool {
        self.has_enter_routine
    }

    /// Whether the bound exit is a multi-tick routine rather than a
    /// synchronous call.
    pub fn has_exit_routine(&self) -> bool {
        self.has_exit_routine
    }

    /// Invoke the callback bound to `phase`.
    pub fn invoke_phase(&self, phase: Phase, actor: &mut A) {
        let action = match phase {
            Phase::EarlyTick => &self.early_tick,
            Phase::Tick => &self.tick,
            Phase::LateTick => &self.late_tick,
        };
        action(actor);
    }

    /// Invoke the `finally` hook.
    pub fn invoke_finally(&self, actor: &mut A) {
        (self.finally_call)(actor);
    }

    pub(crate) fn set_enter_call(&mut self, action: Action<A>) {
        self.enter_call = action;
        self.has_enter_routine = false;
    }

    pub(crate) fn set_enter_routine(&mut self, factory: RoutineFactory<A>) {
        self.enter_routine = factory;
        self.has_enter_routine = true;
    }

    pub(crate) fn set_exit_call(&mut self, action: Action<A>) {
        self.exit_call = action;
        self.has_exit_routine = false;
    }

    pub(crate) fn set_exit_routine(&mut self, factory: RoutineFactory<A>) {
        self.exit_routine = factory;
        self.has_exit_routine = true;
    }

    pub(crate) fn set_finally(&mut self, action: Action<A>) {
        self.finally_call = action;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase, action: Action<A>) {
        match phase {
            Phase::EarlyTick => self.early_tick = action,
            Phase::Tick => self.tick = action,
            Phase::LateTick => self.late_tick = action,
        }
    }

    pub(crate) fn cached_event(&self, name: &str) -> Option<EventAction<A>> {
        self.events.borrow().get(name).cloned()
    }

    pub(crate) fn cache_event(&self, name: String, action: EventAction<A>) {
        self.events.borrow_mut().insert(name, action);
    }
}

impl<A> Default for StateMapping<A> {
    fn default() -> Self {
        Self::no_op()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Counter {
        hits: Cell<u32>,
    }

    #[test]
    fn phase_order_is_fixed() {
        assert_eq!(
            Phase::ORDERED,
            [Phase::EarlyTick, Phase::Tick, Phase::LateTick]
        );
    }

    #[test]
    fn phase_names_are_stable() {
        assert_eq!(Phase::EarlyTick.name(), "early_tick");
        assert_eq!(Phase::Tick.name(), "tick");
        assert_eq!(Phase::LateTick.name(), "late_tick");
    }

    #[test]
    fn no_op_defaults_are_safe_to_invoke() {
        let mapping: StateMapping<Counter> = StateMapping::no_op();
        let mut actor = Counter { hits: Cell::new(0) };

        mapping.invoke_phase(Phase::EarlyTick, &mut actor);
        mapping.invoke_phase(Phase::Tick, &mut actor);
        mapping.invoke_phase(Phase::LateTick, &mut actor);
        mapping.invoke_finally(&mut actor);
        (mapping.enter_call)(&mut actor);
        (mapping.exit_call)(&mut actor);

        assert_eq!(actor.hits.get(), 0);
        assert!(!mapping.has_enter_routine());
        assert!(!mapping.has_exit_routine());
    }

    #[test]
    fn no_op_routine_completes_on_first_poll() {
        let factory: RoutineFactory<Counter> = no_op_routine();
        let mut routine = factory();
        let mut actor = Counter { hits: Cell::new(0) };

        assert_eq!(routine(&mut actor), RoutineStep::Done);
    }

    #[test]
    fn bound_phase_callback_replaces_default() {
        let mut mapping: StateMapping<Counter> = StateMapping::no_op();
        mapping.set_phase(
            Phase::Tick,
            Rc::new(|actor: &mut Counter| actor.hits.set(actor.hits.get() + 1)),
        );

        let mut actor = Counter { hits: Cell::new(0) };
        mapping.invoke_phase(Phase::Tick, &mut actor);
        mapping.invoke_phase(Phase::EarlyTick, &mut actor);

        assert_eq!(actor.hits.get(), 1);
    }

    #[test]
    fn binding_routine_sets_flag() {
        let mut mapping: StateMapping<Counter> = StateMapping::no_op();
        mapping.set_enter_routine(no_op_routine());
        assert!(mapping.has_enter_routine());

        mapping.set_enter_call(no_op_action());
        assert!(!mapping.has_enter_routine());
    }

    #[test]
    fn event_cache_round_trips() {
        let mapping: StateMapping<Counter> = StateMapping::no_op();
        assert!(mapping.cached_event("collision").is_none());

        mapping.cache_event("collision".to_string(), no_op_event());
        assert!(mapping.cached_event("collision").is_some());
    }
}
