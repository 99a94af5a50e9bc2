//! Declarative description of one or more transitions.

use crate::builder::error::SpecError;
use crate::core::{Action, Condition, Event, State};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Accumulated `from → to on event when guard / action` description.
///
/// Fields are optional while the spec is being filled in and are checked
/// together when the owning [`MachineBuilder`](crate::builder::MachineBuilder)
/// builds.
#[derive(Clone, Debug, Default)]
pub struct TransitionSpec {
    pub(crate) from: Vec<State>,
    pub(crate) to: Option<State>,
    pub(crate) event: Option<Event>,
    pub(crate) condition: Option<(String, Condition)>,
    pub(crate) action: Option<(String, Action)>,
}

impl TransitionSpec {
    /// Create an empty transition description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source state. Every source gets its own linker.
    pub fn from(mut self, state: State) -> Self {
        self.from.push(state);
        self
    }

    /// Add several source states at once.
    pub fn from_each(mut self, states: impl IntoIterator<Item = State>) -> Self {
        self.from.extend(states);
        self
    }

    /// Set the target state.
    pub fn to(mut self, state: State) -> Self {
        self.to = Some(state);
        self
    }

    /// Set the triggering event.
    pub fn on(mut self, event: impl Into<Event>) -> Self {
        self.event = Some(event.into());
        self
    }

    /// Guard the transition (optional; defaults to "Any").
    pub fn when(mut self, desc: impl Into<String>, condition: Condition) -> Self {
        self.condition = Some((desc.into(), condition));
        self
    }

    /// Run `action` on entry (optional; defaults to no action).
    pub fn action(mut self, desc: impl Into<String>, action: Action) -> Self {
        self.action = Some((desc.into(), action));
        self
    }

    /// Field checks for the spec at position `index`.
    pub(crate) fn checks(&self, index: usize) -> Vec<Validation<(), NonEmptyVec<SpecError>>> {
        let required = |present: bool, error: SpecError| {
            if present {
                Validation::success(())
            } else {
                Validation::fail(error)
            }
        };
        vec![
            required(!self.from.is_empty(), SpecError::MissingFromState { index }),
            required(self.to.is_some(), SpecError::MissingToState { index }),
            required(self.event.is_some(), SpecError::MissingEvent { index }),
        ]
    }
}
