//! Errors raised while dispatching and executing transitions.

use crate::core::{Event, Key};
use serde::Serialize;
use thiserror::Error;

/// Failure of an entry's action chain, including aggregated fork outcomes.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),

    #[error("fork partially failed: {failed} of {total} sub-entries failed")]
    PartialFailure { failed: usize, total: usize },

    #[error("fork failed: all {total} sub-entries failed")]
    AllFailed { total: usize },

    #[error("action panicked: {0}")]
    Panicked(String),
}

impl ActionError {
    /// Plain failure carrying `message`.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

pub type ActionResult = Result<(), ActionError>;

/// Errors returned by [`StateMachine::trigger`](crate::StateMachine::trigger).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("state '{state}' has no transitions in machine '{machine}'")]
    UnknownState { machine: String, state: Key },

    #[error("event '{event}' is not defined for state '{state}' in machine '{machine}'")]
    UnknownEvent {
        machine: String,
        state: Key,
        event: Event,
    },

    #[error("every guard rejected state '{state}' on event '{event}' in machine '{machine}'")]
    NoMatchingGuard {
        machine: String,
        state: Key,
        event: Event,
    },

    #[error(transparent)]
    Action(#[from] ActionError),
}

impl TriggerError {
    /// True for lookup and guard failures, which point at the machine's
    /// configuration rather than at a failing action.
    pub fn is_configuration(&self) -> bool {
        !matches!(self, Self::Action(_))
    }
}
