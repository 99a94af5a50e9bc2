//! Machine-scoped automaton states.
//!
//! A `State` is a plain value: its identity is its `Key`, and any two states
//! with equal keys are the same state regardless of stereotype or binding.

use super::key::{Event, Key};
use crate::engine::{Entry, Exit};
use serde::Serialize;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier of the terminal pseudo-state every machine can end in.
pub const TERMINAL: &str = "[*]";

/// Node in an automaton.
///
/// The owning machine is recorded by name when the state is bound through
/// [`StateMachine::bind`](crate::StateMachine::bind). Binding is a lookup
/// key, not a reference, so states can link machines that link back.
///
/// # Example
///
/// ```rust
/// use hsmkit::{Event, State};
///
/// let paying = State::new("Paying");
/// let exit = paying.exit("Paid", "payment confirmed");
///
/// assert_eq!(exit.state(), &paying);
/// assert_eq!(exit.event(), &Event::from("Paid"));
/// assert_eq!(State::new("Paying"), paying);
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct State {
    id: Key,
    #[serde(skip_serializing_if = "Option::is_none")]
    stereotype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    machine: Option<String>,
}

impl State {
    /// Unbound state identified by `id`.
    pub fn new(id: impl Into<Key>) -> Self {
        Self {
            id: id.into(),
            stereotype: None,
            machine: None,
        }
    }

    /// The terminal pseudo-state `[*]`.
    pub fn terminal() -> Self {
        Self::new(TERMINAL)
    }

    /// Attach a display tag such as `choice` or `fork`.
    pub fn with_stereotype(mut self, stereotype: impl Into<String>) -> Self {
        self.stereotype = Some(stereotype.into());
        self
    }

    /// Identity used for equality, hashing and table lookups.
    pub fn id(&self) -> &Key {
        &self.id
    }

    pub fn stereotype(&self) -> Option<&str> {
        self.stereotype.as_deref()
    }

    /// Name of the machine this state was last bound to.
    pub fn machine(&self) -> Option<&str> {
        self.machine.as_deref()
    }

    /// True for the `[*]` pseudo-state.
    pub fn is_terminal(&self) -> bool {
        matches!(&self.id, Key::Text(text) if text == TERMINAL)
    }

    pub(crate) fn bound_to(mut self, machine: &str) -> Self {
        self.machine = Some(machine.to_string());
        self
    }

    /// Start an entry into this state. Add actions with [`Entry::action`].
    pub fn entry(&self, desc: impl Into<String>) -> Entry {
        Entry::new(self.clone(), desc)
    }

    /// Leave this state on `event`, guarded by the always-true condition
    /// until [`Exit::when`] replaces it.
    pub fn exit(&self, event: impl Into<Event>, desc: impl Into<String>) -> Exit {
        Exit::new(self.clone(), event, desc)
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
