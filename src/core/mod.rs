//! Identity and capability types shared by every machine.
//!
//! This module contains the value types the engine correlates on:
//! - `Key` / `Event`: equality-compared identifiers
//! - `State`: a machine-scoped node carrying an optional stereotype
//! - `Entity`: the externally owned object driven through a machine
//! - `Condition` / `Action`: the caller-supplied guard and side effect
//! - `Context`: request-scoped values handed to guards and actions

mod action;
mod context;
mod entity;
mod guard;
mod key;
mod state;

pub use action::{noop, Action};
pub use context::Context;
pub use entity::{Entity, SharedEntity};
pub use guard::{any, Condition};
pub use key::{Event, Key};
pub use state::{State, TERMINAL};
