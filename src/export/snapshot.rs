//! Serializable view of assembled machines.

use crate::core::{Event, Key, State};
use crate::engine::{Entry, StateMachine};
use crate::export::{reachable, ExportError, Owners};
use crate::registry::Registry;
use serde::Serialize;

/// Serializable view of one machine's states and transition table.
#[derive(Clone, Debug, Serialize)]
pub struct MachineSnapshot {
    pub name: String,
    pub states: Vec<State>,
    pub starts: Vec<State>,
    pub ends: Vec<State>,
    pub transitions: Vec<TransitionSnapshot>,
}

/// One registered linker, in table order.
#[derive(Clone, Debug, Serialize)]
pub struct TransitionSnapshot {
    pub from: Key,
    pub event: Event,
    pub condition: String,
    pub entry: EntrySnapshot,
}

/// Entry side of a linker; fork entries list their branches.
#[derive(Clone, Debug, Serialize)]
pub struct EntrySnapshot {
    pub to: State,
    /// Machine owning `to`.
    pub machine: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<EntrySnapshot>,
}

impl EntrySnapshot {
    fn capture(machine: &StateMachine, entry: &Entry, owners: Owners<'_>) -> Self {
        let fork = entry.fork();
        Self {
            to: entry.state().clone(),
            machine: owners.resolve(machine, entry.state()),
            action: entry.desc().to_string(),
            executor: fork.map(|fork| fork.executor().to_string()),
            branches: fork
                .map(|fork| {
                    fork.entries()
                        .iter()
                        .map(|branch| Self::capture(machine, branch, owners))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

impl MachineSnapshot {
    fn capture(machine: &StateMachine, owners: Owners<'_>) -> Self {
        let transitions = machine
            .transitions()
            .flat_map(|(from, event, linkers)| {
                linkers.iter().map(move |linker| TransitionSnapshot {
                    from: from.clone(),
                    event: event.clone(),
                    condition: linker.exit().desc().to_string(),
                    entry: EntrySnapshot::capture(machine, linker.entry(), owners),
                })
            })
            .collect();

        Self {
            name: machine.name().to_string(),
            states: machine.states().cloned().collect(),
            starts: machine.starts().cloned().collect(),
            ends: machine.ends().cloned().collect(),
            transitions,
        }
    }
}

/// Snapshot from the machine's own bindings, without a registry.
impl From<&StateMachine> for MachineSnapshot {
    fn from(machine: &StateMachine) -> Self {
        Self::capture(machine, Owners::local())
    }
}

/// Snapshots of `root` and every machine reachable from it.
pub fn snapshot(registry: &Registry, root: &str) -> Result<Vec<MachineSnapshot>, ExportError> {
    let machines = reachable(registry, root)?;
    let owners = Owners::new(registry);
    Ok(machines
        .iter()
        .map(|machine| MachineSnapshot::capture(machine, owners))
        .collect())
}

/// Pretty-printed JSON of [`snapshot`].
pub fn to_json(registry: &Registry, root: &str) -> Result<String, ExportError> {
    let snapshots = snapshot(registry, root)?;
    Ok(serde_json::to_string_pretty(&snapshots)?)
}
