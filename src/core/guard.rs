//! Guard conditions for exits.

use super::context::Context;
use super::entity::SharedEntity;
use super::state::State;
use std::fmt;
use std::sync::Arc;

type Predicate = dyn Fn(&Context, &SharedEntity, &State, &State) -> bool + Send + Sync;

/// Predicate deciding whether an exit may be taken.
///
/// Receives the context, the (possibly substituted) entity, the exit's
/// state and the entry's destination state.
///
/// # Example
///
/// ```rust
/// use hsmkit::Condition;
///
/// let paid = Condition::new(|ctx, _entity, _from, _to| {
///     ctx.value("paid").and_then(|v| v.as_bool()).unwrap_or(false)
/// });
/// # let _ = paid;
/// ```
#[derive(Clone)]
pub struct Condition {
    predicate: Arc<Predicate>,
}

impl Condition {
    /// Wrap a closure as a condition.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Context, &SharedEntity, &State, &State) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate for a move from `from` to `to`.
    pub fn check(&self, ctx: &Context, entity: &SharedEntity, from: &State, to: &State) -> bool {
        (self.predicate)(ctx, entity, from, to)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Condition(..)")
    }
}

/// The always-true condition, described as "Any".
pub fn any() -> Condition {
    Condition::new(|_, _, _, _| true)
}
