//! Request-scoped values passed to guards and actions.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Values and a cancellation flag travelling with one trigger call.
///
/// Cloning is cheap and clones share the cancellation flag. The engine never
/// inspects either; they exist for the caller's guards and actions.
#[derive(Clone, Debug, Default)]
pub struct Context {
    values: Arc<HashMap<String, Value>>,
    cancelled: Arc<AtomicBool>,
}

impl Context {
    /// Empty, uncancelled context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a value without touching other clones.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.values).insert(key.into(), value.into());
        self
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Flag this context and all its clones as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
