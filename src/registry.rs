//! Name → machine lookup shared by an application.

use crate::core::Key;
use crate::engine::StateMachine;
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a machine named '{0}' is already registered")]
    DuplicateMachine(String),
}

/// Explicit, application-owned registry of published machines.
///
/// Machines are added once assembly is finished and are never removed;
/// the registry lives as long as whoever owns it. Lookups hand out shared,
/// read-only machines.
///
/// The registry also indexes which machine owns each state key. A state
/// bound by several machines belongs to the last one registered.
#[derive(Default)]
pub struct Registry {
    inner: RwLock<Published>,
}

#[derive(Default)]
struct Published {
    machines: IndexMap<String, Arc<StateMachine>>,
    owners: IndexMap<Key, String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `machine` under its own name and index the states it binds.
    pub fn register(&self, machine: StateMachine) -> Result<Arc<StateMachine>, RegistryError> {
        let mut published = self.inner.write();
        if published.machines.contains_key(machine.name()) {
            return Err(RegistryError::DuplicateMachine(machine.name().to_string()));
        }
        let machine = Arc::new(machine);
        for state in machine.states().filter(|state| !state.is_terminal()) {
            published
                .owners
                .insert(state.id().clone(), machine.name().to_string());
        }
        published
            .machines
            .insert(machine.name().to_string(), Arc::clone(&machine));
        tracing::debug!(machine = machine.name(), "machine registered");
        Ok(machine)
    }

    /// Look up a machine by name.
    pub fn get(&self, name: &str) -> Option<Arc<StateMachine>> {
        self.inner.read().machines.get(name).cloned()
    }

    /// True if a machine is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().machines.contains_key(name)
    }

    /// Name of the machine that last bound a state with this key.
    pub fn owner_of(&self, key: &Key) -> Option<String> {
        self.inner.read().owners.get(key).cloned()
    }

    /// Registered names in publication order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().machines.keys().cloned().collect()
    }

    /// Number of registered machines.
    pub fn len(&self) -> usize {
        self.inner.read().machines.len()
    }

    /// True when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.inner.read().machines.is_empty()
    }
}
