//! Transition descriptors: guarded exits, entry action chains and the
//! linkers pairing them in the transition table.

use crate::core::{any, Action, Condition, Context, Event, SharedEntity, State};
use crate::engine::error::ActionResult;
use crate::engine::fork::Fork;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Leaving `state` on `event`, provided the guard holds.
#[derive(Clone, Debug)]
pub struct Exit {
    state: State,
    event: Event,
    condition: Condition,
    guarded: bool,
    desc: String,
}

impl Exit {
    /// Unguarded exit from `state` on `event`.
    pub fn new(state: State, event: impl Into<Event>, desc: impl Into<String>) -> Self {
        Self {
            state,
            event: event.into(),
            condition: any(),
            guarded: false,
            desc: desc.into(),
        }
    }

    /// Replace the always-true guard.
    pub fn when(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self.guarded = true;
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Event the exit fires on.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Guard description; an unguarded exit without one reads "Any".
    pub fn desc(&self) -> &str {
        if self.desc.is_empty() && !self.guarded {
            "Any"
        } else {
            &self.desc
        }
    }

    pub(crate) fn with_state(mut self, state: State) -> Self {
        self.state = state;
        self
    }

    pub(crate) fn allows(&self, ctx: &Context, entity: &SharedEntity, to: &State) -> bool {
        self.condition.check(ctx, entity, &self.state, to)
    }
}

/// Arrival into a state, running its actions in order.
///
/// The first failing action aborts the rest. A fork entry runs its
/// sub-entries through the fork's executor first.
#[derive(Clone, Debug)]
pub struct Entry {
    state: State,
    desc: String,
    actions: Vec<Action>,
    fork: Option<Arc<Fork>>,
}

impl Entry {
    /// Entry into `state` with no actions yet.
    pub fn new(state: State, desc: impl Into<String>) -> Self {
        Self {
            state,
            desc: desc.into(),
            actions: Vec::new(),
            fork: None,
        }
    }

    pub(crate) fn forked(state: State, fork: Fork) -> Self {
        Self {
            state,
            desc: "Fork".to_string(),
            actions: Vec::new(),
            fork: Some(Arc::new(fork)),
        }
    }

    /// Append one action.
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Append several actions in order.
    pub fn actions(mut self, actions: impl IntoIterator<Item = Action>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Description of the entry's actions.
    pub fn desc(&self) -> &str {
        &self.desc
    }

    /// Sub-entries run before this entry's own actions.
    pub fn fork(&self) -> Option<&Fork> {
        self.fork.as_deref()
    }

    /// Run the entry as the destination of a transition leaving `from`.
    pub fn run(&self, ctx: &Context, entity: &SharedEntity, from: &State) -> ActionResult {
        if let Some(fork) = &self.fork {
            fork.run(ctx, entity, from)?;
        }
        for action in &self.actions {
            action.run(ctx, entity, from, &self.state)?;
        }
        Ok(())
    }
}

/// One registered `(Exit, Entry)` pairing.
#[derive(Clone, Debug)]
pub struct ConditionLinker {
    exit: Exit,
    entry: Entry,
}

impl ConditionLinker {
    pub(crate) fn new(exit: Exit, entry: Entry) -> Self {
        Self { exit, entry }
    }

    pub fn exit(&self) -> &Exit {
        &self.exit
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub(crate) fn allows(&self, ctx: &Context, entity: &SharedEntity) -> bool {
        self.exit.allows(ctx, entity, self.entry.state())
    }

    /// Plain descriptor handed to filters and logs.
    pub fn transition(&self) -> Transition {
        Transition {
            from: self.exit.state.clone(),
            event: self.exit.event.clone(),
            to: self.entry.state.clone(),
            condition: self.exit.desc().to_string(),
            action: self.entry.desc.clone(),
        }
    }
}

/// Plain description of a transition, handed to filters after it ran.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transition {
    pub from: State,
    pub event: Event,
    pub to: State,
    pub condition: String,
    pub action: String,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "F({} = {}<{}>) -> {}: {}",
            self.from, self.event, self.condition, self.to, self.action
        )
    }
}
