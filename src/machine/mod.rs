//! State machines and the transition protocol.
//!
//! One [`MachineHandle`] exists per managed actor. The handle is cheap
//! to clone and is what the runner, the host, and callbacks all hold.
//! Machine state itself (current state, mapping table, in-flight
//! transition, history) sits behind shared interior mutability so that
//! user callbacks always run with the machine unborrowed. A callback
//! may call back into [`MachineHandle::change_state`]: mid-transition
//! the request gets the documented rejection, and from a phase
//! callback the new transition is installed and progressed on the next
//! `Tick`, never a borrow panic either way.

mod transition;

pub use transition::TransitionError;

use crate::core::{
    no_op_event, Phase, RoutineStep, StateId, StateMapping, TransitionHistory, TransitionRecord,
};
use crate::resolver::{Binding, CallbackResolver, SlotName};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};
use transition::{Stage, TransitionSeq};

/// Opaque identity of a registered machine.
///
/// Returned by the runner at registration and accepted by `remove`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct InstanceId(uuid::Uuid);

impl InstanceId {
    pub(crate) fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

struct MachineInner<A, S: StateId> {
    current: Option<S>,
    current_mapping: Rc<StateMapping<A>>,
    mappings: HashMap<S, Rc<StateMapping<A>>>,
    transition: Option<TransitionSeq<A, S>>,
    history: TransitionHistory<S>,
}

impl<A, S: StateId> MachineInner<A, S> {
    fn new() -> Self {
        Self {
            current: None,
            current_mapping: Rc::new(StateMapping::no_op()),
            mappings: HashMap::new(),
            transition: None,
            history: TransitionHistory::new(),
        }
    }
}

/// Handle to one state machine bound to one actor.
///
/// Created by [`Runner::initialize`]; cloning shares the same machine.
/// The actor is shared, never owned; the machine touches it only to
/// pass `&mut A` into resolved callbacks.
///
/// [`Runner::initialize`]: crate::runner::Runner::initialize
pub struct MachineHandle<A: 'static, S: StateId> {
    id: InstanceId,
    actor: Rc<RefCell<A>>,
    resolver: Rc<dyn CallbackResolver<A, S>>,
    inner: Rc<RefCell<MachineInner<A, S>>>,
    detached: Rc<Cell<bool>>,
}

impl<A: 'static, S: StateId> Clone for MachineHandle<A, S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            actor: self.actor.clone(),
            resolver: self.resolver.clone(),
            inner: self.inner.clone(),
            detached: self.detached.clone(),
        }
    }
}

impl<A: 'static, S: StateId> MachineHandle<A, S> {
    pub(crate) fn new(actor: Rc<RefCell<A>>, resolver: Rc<dyn CallbackResolver<A, S>>) -> Self {
        Self {
            id: InstanceId::new(),
            actor,
            resolver,
            inner: Rc::new(RefCell::new(MachineInner::new())),
            detached: Rc::new(Cell::new(false)),
        }
    }

    /// This machine's registration identity.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether a transition is currently in flight. While true, phase
    /// callbacks and new transition requests are suppressed.
    pub fn is_in_transition(&self) -> bool {
        self.inner.borrow().transition.is_some()
    }

    /// The active state, or `None` before the first transition
    /// completes.
    pub fn current_state(&self) -> Option<S> {
        self.inner.borrow().current.clone()
    }

    /// The active mapping used for phase dispatch. Before the first
    /// transition completes this is the shared no-op mapping; during a
    /// transition it remains the mapping being exited.
    pub fn current_mapping(&self) -> Rc<StateMapping<A>> {
        self.inner.borrow().current_mapping.clone()
    }

    /// History of completed transitions, oldest first.
    pub fn history(&self) -> TransitionHistory<S> {
        self.inner.borrow().history.clone()
    }

    /// Request a transition from the current state to `to`.
    ///
    /// Synchronous exit/enter callbacks complete before this returns.
    /// An asynchronous routine is begun (run to its first yield) and
    /// then progressed once per scheduler tick until it finishes; the
    /// machine reports [`is_in_transition`] for the whole span.
    ///
    /// If a transition is already in flight the request is rejected and
    /// logged: overlapping transitions on one machine never interleave.
    ///
    /// Called from inside one of this machine's own phase callbacks,
    /// the transition is installed but not begun until the next `Tick`
    /// progression; the machine reports [`is_in_transition`]
    /// immediately.
    ///
    /// [`is_in_transition`]: MachineHandle::is_in_transition
    pub fn change_state(&self, to: S) -> Result<(), TransitionError> {
        {
            let mut machine = self.inner.borrow_mut();
            if machine.transition.is_some() {
                warn!(
                    machine = %self.id,
                    to = to.name(),
                    "change_state rejected: transition already in flight"
                );
                return Err(TransitionError::AlreadyTransitioning {
                    to: to.name().to_string(),
                });
            }

            debug!(
                machine = %self.id,
                from = machine.current.as_ref().map(StateId::name).unwrap_or("<none>"),
                to = to.name(),
                "transition started"
            );
            let old_mapping = machine.current.is_some().then(|| machine.current_mapping.clone());
            machine.transition = Some(TransitionSeq::new(to, old_mapping));
        }

        // The actor is already mutably borrowed when this is called
        // from inside one of its own phase callbacks. The cursor then
        // stays at its first stage and the next Tick progression runs
        // it, after the callback has returned the borrow.
        if self.actor.try_borrow_mut().is_ok() {
            self.advance_transition();
        }
        Ok(())
    }

    /// Dispatch a named event to the current state's event callback.
    ///
    /// The payload is opaque to the scheduler. Unbound events fall back
    /// to the shared no-op; events are suppressed while a transition is
    /// in flight, like phase callbacks. An event raised from inside one
    /// of this machine's own callbacks is dropped and logged, since its
    /// callback would need a second exclusive borrow of the actor.
    pub fn raise_event(&self, name: &str, payload: &dyn Any) {
        let (mapping, state) = {
            let machine = self.inner.borrow();
            if machine.transition.is_some() {
                return;
            }
            let Some(state) = machine.current.clone() else {
                return;
            };
            (machine.current_mapping.clone(), state)
        };

        // A callback of this machine is on the stack if the actor is
        // already borrowed; an event raised from there has no actor to
        // hand its callback, so it is dropped and logged.
        let Ok(mut actor) = self.actor.try_borrow_mut() else {
            warn!(
                machine = %self.id,
                state = state.name(),
                event = name,
                "event dropped: raised from inside one of this machine's callbacks"
            );
            return;
        };

        let action = match mapping.cached_event(name) {
            Some(action) => action,
            None => {
                let slot = SlotName::Event(name.to_string());
                let binding = self.resolver.resolve(&actor, &state, &slot);
                let action = match binding {
                    Binding::Event(action) => action,
                    Binding::Default => no_op_event(),
                    other => {
                        warn!(
                            machine = %self.id,
                            state = state.name(),
                            slot = %slot,
                            kind = other.kind(),
                            "ignoring binding of wrong kind for event slot"
                        );
                        no_op_event()
                    }
                };
                mapping.cache_event(name.to_string(), action.clone());
                action
            }
        };

        action(&mut actor, payload);
    }

    pub(crate) fn is_detached(&self) -> bool {
        self.detached.get()
    }

    pub(crate) fn detach(&self) {
        self.detached.set(true);
    }

    /// Invoke the current mapping's callback for `phase`. Suppressed
    /// while a transition is in flight.
    pub(crate) fn dispatch_phase(&self, phase: Phase) {
        let mapping = {
            let machine = self.inner.borrow();
            if machine.transition.is_some() {
                return;
            }
            machine.current_mapping.clone()
        };
        mapping.invoke_phase(phase, &mut self.actor.borrow_mut());
    }

    /// Progress the in-flight transition, if any.
    ///
    /// Runs the cursor until it completes or an asynchronous routine
    /// yields. The machine borrow is released around every callback, so
    /// callbacks observe a consistent in-transition machine and a
    /// re-entrant `change_state` from an exit or enter callback is
    /// rejected cleanly.
    pub(crate) fn advance_transition(&self) {
        loop {
            let stage = {
                let mut machine = self.inner.borrow_mut();
                match machine.transition.as_mut() {
                    Some(seq) => seq.stage.take(),
                    None => return,
                }
            };
            let Some(stage) = stage else {
                return;
            };

            match stage {
                Stage::BeginExit => match self.old_mapping() {
                    None => self.set_stage(Stage::Assign),
                    Some(mapping) if mapping.has_exit_routine() => {
                        let routine = (mapping.exit_routine)();
                        self.set_stage(Stage::ExitRoutine(routine));
                    }
                    Some(mapping) => {
                        (mapping.exit_call)(&mut self.actor.borrow_mut());
                        self.set_stage(Stage::Finalize);
                    }
                },
                Stage::ExitRoutine(mut routine) => {
                    match routine(&mut self.actor.borrow_mut()) {
                        RoutineStep::Yield => {
                            self.set_stage(Stage::ExitRoutine(routine));
                            return;
                        }
                        RoutineStep::Done => self.set_stage(Stage::Finalize),
                    }
                }
                Stage::Finalize => {
                    if let Some(mapping) = self.old_mapping() {
                        mapping.invoke_finally(&mut self.actor.borrow_mut());
                    }
                    self.set_stage(Stage::Assign);
                }
                Stage::Assign => {
                    let Some(to) = self
                        .inner
                        .borrow()
                        .transition
                        .as_ref()
                        .map(|seq| seq.to.clone())
                    else {
                        return;
                    };
                    let mapping = self.mapping_for(&to);
                    if let Some(seq) = self.inner.borrow_mut().transition.as_mut() {
                        seq.dest_mapping = Some(mapping);
                    }
                    self.set_stage(Stage::BeginEnter);
                }
                Stage::BeginEnter => {
                    let Some(dest) = self.dest_mapping() else {
                        return;
                    };
                    if dest.has_enter_routine() {
                        let routine = (dest.enter_routine)();
                        self.set_stage(Stage::EnterRoutine(routine));
                    } else {
                        (dest.enter_call)(&mut self.actor.borrow_mut());
                        self.set_stage(Stage::Complete);
                    }
                }
                Stage::EnterRoutine(mut routine) => {
                    match routine(&mut self.actor.borrow_mut()) {
                        RoutineStep::Yield => {
                            self.set_stage(Stage::EnterRoutine(routine));
                            return;
                        }
                        RoutineStep::Done => self.set_stage(Stage::Complete),
                    }
                }
                Stage::Complete => {
                    let mut machine = self.inner.borrow_mut();
                    if let Some(seq) = machine.transition.take() {
                        if let Some(dest) = seq.dest_mapping {
                            let from = machine.current.replace(seq.to.clone());
                            machine.current_mapping = dest;
                            machine.history = machine.history.record(TransitionRecord {
                                from: from.clone(),
                                to: seq.to.clone(),
                                timestamp: Utc::now(),
                            });
                            debug!(
                                machine = %self.id,
                                from = from.as_ref().map(StateId::name).unwrap_or("<none>"),
                                to = seq.to.name(),
                                "transition complete"
                            );
                        }
                    }
                    return;
                }
            }
        }
    }

    fn set_stage(&self, stage: Stage<A>) {
        if let Some(seq) = self.inner.borrow_mut().transition.as_mut() {
            seq.stage = Some(stage);
        }
    }

    fn old_mapping(&self) -> Option<Rc<StateMapping<A>>> {
        self.inner
            .borrow()
            .transition
            .as_ref()
            .and_then(|seq| seq.old_mapping.clone())
    }

    fn dest_mapping(&self) -> Option<Rc<StateMapping<A>>> {
        self.inner
            .borrow()
            .transition
            .as_ref()
            .and_then(|seq| seq.dest_mapping.clone())
    }

    /// Get or lazily build the mapping for `state`. Resolution happens
    /// once per state; subsequent transitions reuse the cached mapping.
    fn mapping_for(&self, state: &S) -> Rc<StateMapping<A>> {
        if let Some(existing) = self.inner.borrow().mappings.get(state).cloned() {
            return existing;
        }
        let built = Rc::new(self.build_mapping(state));
        self.inner
            .borrow_mut()
            .mappings
            .insert(state.clone(), built.clone());
        built
    }

    fn build_mapping(&self, state: &S) -> StateMapping<A> {
        let actor = self.actor.borrow();
        let mut mapping = StateMapping::no_op();

        match self.resolver.resolve(&actor, state, &SlotName::Enter) {
            Binding::Call(action) => mapping.set_enter_call(action),
            Binding::Routine(factory) => mapping.set_enter_routine(factory),
            Binding::Default => {}
            other => self.warn_wrong_kind(state, &SlotName::Enter, &other),
        }
        match self.resolver.resolve(&actor, state, &SlotName::Exit) {
            Binding::Call(action) => mapping.set_exit_call(action),
            Binding::Routine(factory) => mapping.set_exit_routine(factory),
            Binding::Default => {}
            other => self.warn_wrong_kind(state, &SlotName::Exit, &other),
        }
        match self.resolver.resolve(&actor, state, &SlotName::Finally) {
            Binding::Call(action) => mapping.set_finally(action),
            Binding::Default => {}
            other => self.warn_wrong_kind(state, &SlotName::Finally, &other),
        }
        for phase in Phase::ORDERED {
            let slot = SlotName::Phase(phase);
            match self.resolver.resolve(&actor, state, &slot) {
                Binding::Call(action) => mapping.set_phase(phase, action),
                Binding::Default => {}
                other => self.warn_wrong_kind(state, &slot, &other),
            }
        }

        mapping
    }

    fn warn_wrong_kind(&self, state: &S, slot: &SlotName, binding: &Binding<A>) {
        warn!(
            machine = %self.id,
            state = state.name(),
            slot = %slot,
            kind = binding.kind(),
            "ignoring binding of wrong kind; keeping no-op default"
        );
    }
}
