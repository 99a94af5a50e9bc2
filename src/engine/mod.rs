//! The dispatch engine around the identity types in [`crate::core`].
//!
//! # Key Concepts
//!
//! - **Transitions**: guarded `Exit`s paired with `Entry` action chains
//! - **State Machine**: owns the transition table and dispatches `trigger`
//! - **Fork/Join**: one entry fanned out to many, joined by a strategy
//! - **Hooks**: per-entity lockers and before/after filters

mod error;
mod filter;
mod fork;
mod locker;
mod machine;
mod strategy;
mod transition;

pub use error::{ActionError, ActionResult, TriggerError};
pub use filter::{Filter, HistoryFilter, NoopFilter, TracingFilter, TransitionRecord};
pub use fork::{Executor, Fork, Schedule};
pub use locker::{EntityLock, EntityLockers, Locker, LockerFactory};
pub use machine::{aspect, locker, ForkBuilder, MachineOption, StateMachine};
pub use strategy::{Join, Latch, Strategy, SuccessStrategy};
pub use transition::{ConditionLinker, Entry, Exit, Transition};
