//! Stagehand: a tick-driven state machine scheduler for actor behaviors.
//!
//! A [`Runner`] owns any number of independent state-machine instances,
//! one per actor, and drives each instance's current state through
//! three ordered phases per tick. State transitions go through an
//! enter/exit protocol that may itself span multiple ticks, and the
//! runner guarantees that transition progression never overlaps with
//! normal phase dispatch on the same instance.
//!
//! # Core Concepts
//!
//! - **StateId**: discrete state identifiers via the [`StateId`] trait
//! - **Mapping**: the bundle of callbacks bound to one state, with
//!   verified no-op defaults for every unbound slot
//! - **Resolver**: the seam through which callbacks are bound; the
//!   scheduler consumes a [`CallbackResolver`], it never discovers
//!   behavior itself
//! - **Phases**: `EarlyTick` → `Tick` → `LateTick`, barrier-synchronized
//!   across the whole instance set
//!
//! # Example
//!
//! ```rust
//! use stagehand::builder::ResolverBuilder;
//! use stagehand::runner::Runner;
//! use stagehand::state_id;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! state_id! {
//!     enum GuardState {
//!         Patrolling,
//!         Alerted,
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Guard {
//!     steps: u32,
//! }
//!
//! let resolver = ResolverBuilder::<Guard, GuardState>::new()
//!     .on_tick(GuardState::Patrolling, |guard| guard.steps += 1)
//!     .on_enter(GuardState::Alerted, |guard| guard.steps = 0)
//!     .build()
//!     .unwrap();
//!
//! let runner = Runner::new();
//! let actor = Rc::new(RefCell::new(Guard::default()));
//! let guard = runner
//!     .initialize_in(actor.clone(), Rc::new(resolver), GuardState::Patrolling)
//!     .unwrap();
//!
//! runner.run_frame();
//! runner.run_frame();
//! assert_eq!(actor.borrow().steps, 2);
//!
//! guard.change_state(GuardState::Alerted).unwrap();
//! assert_eq!(actor.borrow().steps, 0);
//! ```

pub mod builder;
pub mod core;
pub mod machine;
pub mod resolver;
pub mod runner;

// Re-export commonly used types
pub use crate::core::{Phase, Routine, RoutineStep, StateId, StateMapping};
pub use builder::{BuildError, ResolverBuilder, TableResolver};
pub use machine::{InstanceId, MachineHandle, TransitionError};
pub use resolver::{Binding, CallbackResolver, NullResolver, SlotName};
pub use runner::Runner;
