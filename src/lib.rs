//! hsmkit: hierarchical state machines driving external entities
//!
//! Machines are assembled once, published into a [`Registry`] and then
//! shared read-only. Entities own their current state; the engine only
//! selects a transition and runs its actions, which are responsible for
//! moving the entity along.
//!
//! # Core Concepts
//!
//! - **State / Event**: equality-compared identifiers, see [`core`]
//! - **Exit / Entry**: a guarded departure paired with an action chain
//! - **Fork/Join**: one entry fanned out to many sub-entries, joined by a
//!   [`Strategy`] under a serial or parallel [`Executor`]
//! - **Hierarchy**: entries may land on states bound to other machines
//! - **Hooks**: per-entity [`Locker`]s and before/after [`Filter`]s
//!
//! # Example
//!
//! ```rust
//! use hsmkit::{Action, Context, Entity, Registry, SharedEntity, State, StateMachine};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! struct Order {
//!     state: Mutex<State>,
//! }
//!
//! impl Entity for Order {
//!     fn id(&self) -> &str {
//!         "order-1"
//!     }
//!
//!     fn state(&self) -> State {
//!         self.state.lock().clone()
//!     }
//! }
//!
//! let order = Arc::new(Order { state: Mutex::new(State::new("Start")) });
//! let moved = Arc::clone(&order);
//!
//! let mut machine = StateMachine::new("orders", []);
//! machine.trans(
//!     State::new("Start").exit("Create", ""),
//!     State::new("WaitPay").entry("create").action(Action::new(move |_, _, _, to| {
//!         *moved.state.lock() = to.clone();
//!         Ok(())
//!     })),
//! );
//!
//! let registry = Registry::new();
//! let machine = registry.register(machine).unwrap();
//!
//! let entity: SharedEntity = order.clone();
//! machine.trigger(&Context::new(), entity, "Create").unwrap();
//! assert_eq!(order.state(), State::new("WaitPay"));
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod export;
pub mod registry;

// Re-export commonly used types
pub use crate::core::{
    any, noop, Action, Condition, Context, Entity, Event, Key, SharedEntity, State, TERMINAL,
};
pub use engine::{
    aspect, locker, ActionError, ActionResult, Entry, Executor, Exit, Filter, Locker,
    LockerFactory, MachineOption, StateMachine, Strategy, SuccessStrategy, Transition,
    TriggerError,
};
pub use registry::{Registry, RegistryError};
