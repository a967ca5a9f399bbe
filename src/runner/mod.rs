//! The tick scheduler.
//!
//! A [`Runner`] owns the registry of live machines and drives the three
//! ordered phases of each tick across all of them. It is explicitly
//! constructed and passed by reference, never a process-wide instance,
//! and its lifecycle belongs to the host's top-level driver loop.
//!
//! # Tick model
//!
//! The host calls [`Runner::run_phase`] once per phase per simulation
//! frame, in the fixed order `EarlyTick` → `Tick` → `LateTick` (or
//! [`Runner::run_frame`] for all three). Each phase visits every
//! registered machine in registration order and is barrier-synchronized:
//! a phase completes across the whole set before the next begins.
//! Machines mid-transition are skipped for phase dispatch; their
//! in-flight exit/enter routines are progressed exactly once per `Tick`
//! phase.

use crate::core::{Phase, StateId};
use crate::machine::{InstanceId, MachineHandle, TransitionError};
use crate::resolver::CallbackResolver;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Runner-facing view of a registered machine, erasing its actor and
/// state-id types.
pub(crate) trait Instance {
    fn id(&self) -> InstanceId;
    fn is_detached(&self) -> bool;
    fn is_in_transition(&self) -> bool;
    fn detach(&self);
    fn dispatch_phase(&self, phase: Phase);
    fn advance_transition(&self);
}

impl<A: 'static, S: StateId> Instance for MachineHandle<A, S> {
    fn id(&self) -> InstanceId {
        MachineHandle::id(self)
    }

    fn is_detached(&self) -> bool {
        MachineHandle::is_detached(self)
    }

    fn is_in_transition(&self) -> bool {
        MachineHandle::is_in_transition(self)
    }

    fn detach(&self) {
        MachineHandle::detach(self)
    }

    fn dispatch_phase(&self, phase: Phase) {
        MachineHandle::dispatch_phase(self, phase)
    }

    fn advance_transition(&self) {
        MachineHandle::advance_transition(self)
    }
}

/// Registry and tick driver for state-machine instances.
///
/// Registration order is tick order: every phase visits machines in the
/// order they were initialized. Registration and removal may happen
/// mid-tick (from inside callbacks); a phase iterates over a snapshot
/// of the registry taken when the phase started, so machines registered
/// at phase start are neither skipped nor double-invoked.
///
/// # Example
///
/// ```rust
/// use stagehand::runner::Runner;
/// use stagehand::resolver::NullResolver;
/// use stagehand::state_id;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// state_id! {
///     enum DoorState {
///         Open,
///         Closed,
///     }
/// }
///
/// struct Door;
///
/// let runner = Runner::new();
/// let actor = Rc::new(RefCell::new(Door));
/// let door = runner
///     .initialize_in(actor, Rc::new(NullResolver), DoorState::Closed)
///     .unwrap();
///
/// runner.run_frame();
/// assert_eq!(door.current_state(), Some(DoorState::Closed));
/// ```
pub struct Runner {
    instances: RefCell<Vec<Rc<dyn Instance>>>,
}

impl Runner {
    /// Create an empty runner.
    pub fn new() -> Self {
        Self {
            instances: RefCell::new(Vec::new()),
        }
    }

    /// Create a machine bound to `actor` and register it.
    ///
    /// The machine starts with no active state; nothing is dispatched
    /// to it until the first [`change_state`] completes. The actor is
    /// shared with the host, never owned, and never inspected beyond
    /// what the resolver binds against it.
    ///
    /// [`change_state`]: MachineHandle::change_state
    pub fn initialize<A: 'static, S: StateId>(
        &self,
        actor: Rc<RefCell<A>>,
        resolver: Rc<dyn CallbackResolver<A, S>>,
    ) -> MachineHandle<A, S> {
        let handle = MachineHandle::new(actor, resolver);
        debug!(machine = %handle.id(), "machine registered");
        self.instances.borrow_mut().push(Rc::new(handle.clone()));
        handle
    }

    /// Create, register, and immediately transition into `start_state`.
    ///
    /// The transition is performed synchronously before returning; an
    /// asynchronous enter routine on the start state begins here and
    /// spans subsequent ticks.
    pub fn initialize_in<A: 'static, S: StateId>(
        &self,
        actor: Rc<RefCell<A>>,
        resolver: Rc<dyn CallbackResolver<A, S>>,
        start_state: S,
    ) -> Result<MachineHandle<A, S>, TransitionError> {
        let handle = self.initialize(actor, resolver);
        handle.change_state(start_state)?;
        Ok(handle)
    }

    /// Unregister a machine. Subsequent phases ignore it, including any
    /// in-flight transition progression. Safe to call from inside a
    /// callback during a tick.
    ///
    /// Returns `false` if no machine with `id` is registered.
    pub fn remove(&self, id: InstanceId) -> bool {
        let mut instances = self.instances.borrow_mut();
        match instances.iter().position(|instance| instance.id() == id) {
            Some(index) => {
                let instance = instances.remove(index);
                instance.detach();
                debug!(machine = %id, "machine removed");
                true
            }
            None => false,
        }
    }

    /// Number of registered machines.
    pub fn len(&self) -> usize {
        self.instances.borrow().len()
    }

    /// Whether no machines are registered.
    pub fn is_empty(&self) -> bool {
        self.instances.borrow().is_empty()
    }

    /// Drive one phase across every registered machine, in registration
    /// order.
    ///
    /// Machines mid-transition receive no phase callback; during the
    /// `Tick` phase each machine additionally progresses its in-flight
    /// transition exactly once, whether or not it is transitioning when
    /// the phase starts.
    pub fn run_phase(&self, phase: Phase) {
        let snapshot: Vec<Rc<dyn Instance>> = self.instances.borrow().clone();
        for instance in &snapshot {
            if instance.is_detached() {
                continue;
            }
            if !instance.is_in_transition() {
                instance.dispatch_phase(phase);
            }
            if phase == Phase::Tick {
                instance.advance_transition();
            }
        }
    }

    /// Drive a whole tick: `EarlyTick`, `Tick`, `LateTick` in order.
    pub fn run_frame(&self) {
        for phase in Phase::ORDERED {
            self.run_phase(phase);
        }
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}
