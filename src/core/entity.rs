//! The externally owned object a machine drives.

use super::state::State;
use std::sync::Arc;

/// Object moved through a machine by [`StateMachine::trigger`](crate::StateMachine::trigger).
///
/// The engine only reads `id` and `state`. Any state change is made by the
/// caller's own actions, so implementations hold their state behind
/// whatever interior mutability they need.
pub trait Entity: Send + Sync {
    /// Stable identifier, also the scope of the per-entity lock.
    fn id(&self) -> &str;

    /// Current state, looked up in the transition table on every trigger.
    fn state(&self) -> State;
}

/// Entities are shared so parallel fork tasks can outlive the call frame.
pub type SharedEntity = Arc<dyn Entity>;
