//! Before/after hooks wrapping every trigger call.

use crate::core::{Context, Event, SharedEntity};
use crate::engine::error::ActionError;
use crate::engine::transition::Transition;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

/// Aspect applied around the guarded part of [`StateMachine::trigger`](crate::StateMachine::trigger).
///
/// `before` runs once the per-entity lock is held and may substitute the
/// entity for the rest of the call. `after` observes the executed
/// transition and its outcome; it is skipped when dispatch fails before an
/// action runs.
pub trait Filter: Send + Sync {
    fn before(&self, ctx: &Context, entity: SharedEntity, event: &Event) -> SharedEntity;

    fn after(
        &self,
        ctx: &Context,
        entity: &SharedEntity,
        transition: &Transition,
        result: Result<(), &ActionError>,
    );
}

/// Pass-through filter used when a machine has no aspect configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopFilter;

impl Filter for NoopFilter {
    fn before(&self, _ctx: &Context, entity: SharedEntity, _event: &Event) -> SharedEntity {
        entity
    }

    fn after(
        &self,
        _ctx: &Context,
        _entity: &SharedEntity,
        _transition: &Transition,
        _result: Result<(), &ActionError>,
    ) {
    }
}

/// Logs every dispatched event and its outcome.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingFilter;

impl Filter for TracingFilter {
    fn before(&self, _ctx: &Context, entity: SharedEntity, event: &Event) -> SharedEntity {
        tracing::debug!(entity = entity.id(), event = %event, "dispatching event");
        entity
    }

    fn after(
        &self,
        _ctx: &Context,
        entity: &SharedEntity,
        transition: &Transition,
        result: Result<(), &ActionError>,
    ) {
        match result {
            Ok(()) => tracing::info!(entity = entity.id(), %transition, "transition completed"),
            Err(error) => tracing::warn!(
                entity = entity.id(),
                %transition,
                error = %error,
                "transition action failed"
            ),
        }
    }
}

/// Record of one executed transition.
#[derive(Clone, Debug, Serialize)]
pub struct TransitionRecord {
    pub entity: String,
    pub transition: Transition,
    pub timestamp: DateTime<Utc>,
    pub error: Option<ActionError>,
}

impl TransitionRecord {
    /// True when the transition's actions all succeeded.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Keeps an ordered log of every executed transition.
#[derive(Debug, Default)]
pub struct HistoryFilter {
    records: Mutex<Vec<TransitionRecord>>,
}

impl HistoryFilter {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every record, oldest first.
    pub fn records(&self) -> Vec<TransitionRecord> {
        self.records.lock().clone()
    }

    /// Records for one entity, oldest first.
    pub fn records_for(&self, entity: &str) -> Vec<TransitionRecord> {
        self.records
            .lock()
            .iter()
            .filter(|record| record.entity == entity)
            .cloned()
            .collect()
    }

    /// Number of recorded transitions.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Filter for HistoryFilter {
    fn before(&self, _ctx: &Context, entity: SharedEntity, _event: &Event) -> SharedEntity {
        entity
    }

    fn after(
        &self,
        _ctx: &Context,
        entity: &SharedEntity,
        transition: &Transition,
        result: Result<(), &ActionError>,
    ) {
        self.records.lock().push(TransitionRecord {
            entity: entity.id().to_string(),
            transition: transition.clone(),
            timestamp: Utc::now(),
            error: result.err().cloned(),
        });
    }
}
