//! Read-only exporters rendering machines and the machines they link into.
//!
//! Links between machines may form cycles (A enters B, B enters A). Every
//! exporter walks the link graph through [`reachable`], which visits each
//! machine once.
//!
//! An entry whose state was never bound by the machine building it is
//! attributed to the registered machine owning that key, if any.

mod diagram;
mod snapshot;

pub use diagram::{render, render_machine};
pub use snapshot::{snapshot, to_json, EntrySnapshot, MachineSnapshot, TransitionSnapshot};

use crate::core::State;
use crate::engine::{Entry, StateMachine};
use crate::registry::Registry;
use indexmap::IndexSet;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("machine '{0}' is not registered")]
    UnknownMachine(String),

    #[error("failed to encode snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolves which machine an entry state belongs to.
#[derive(Clone, Copy)]
pub(crate) struct Owners<'a> {
    registry: Option<&'a Registry>,
}

impl<'a> Owners<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    /// Resolution from bindings alone.
    pub(crate) fn local() -> Self {
        Self { registry: None }
    }

    /// Owner of `state` as seen from `machine`: an explicit binding first,
    /// then `machine` itself if it binds the key, then the registry index.
    pub(crate) fn resolve(&self, machine: &StateMachine, state: &State) -> String {
        if let Some(owner) = state.machine() {
            return owner.to_string();
        }
        if machine.state_of(state.id()).is_some() {
            return machine.name().to_string();
        }
        self.registry
            .and_then(|registry| registry.owner_of(state.id()))
            .unwrap_or_else(|| machine.name().to_string())
    }

    /// Other machines that `machine`'s entries land in, in link order.
    pub(crate) fn links(&self, machine: &StateMachine) -> IndexSet<String> {
        let mut linked = IndexSet::new();
        for (_, _, linkers) in machine.transitions() {
            for linker in linkers {
                self.collect(machine, linker.entry(), &mut linked);
            }
        }
        linked
    }

    fn collect(&self, machine: &StateMachine, entry: &Entry, linked: &mut IndexSet<String>) {
        let owner = self.resolve(machine, entry.state());
        if owner != machine.name() {
            linked.insert(owner);
        }
        if let Some(fork) = entry.fork() {
            for branch in fork.entries() {
                self.collect(machine, branch, linked);
            }
        }
    }
}

/// `root` followed by every registered machine reachable through entry
/// links, each exactly once, depth first in link order.
///
/// Linked machines that were never registered are skipped.
pub fn reachable(registry: &Registry, root: &str) -> Result<Vec<Arc<StateMachine>>, ExportError> {
    let root = registry
        .get(root)
        .ok_or_else(|| ExportError::UnknownMachine(root.to_string()))?;

    let owners = Owners::new(registry);
    let mut visited = IndexSet::new();
    let mut order = Vec::new();
    let mut pending = vec![root];
    while let Some(machine) = pending.pop() {
        if !visited.insert(machine.name().to_string()) {
            continue;
        }
        for name in owners.links(&machine).into_iter().rev() {
            if visited.contains(&name) {
                continue;
            }
            match registry.get(&name) {
                Some(linked) => pending.push(linked),
                None => tracing::debug!(
                    machine = machine.name(),
                    linked = %name,
                    "linked machine is not registered"
                ),
            }
        }
        order.push(machine);
    }
    Ok(order)
}
