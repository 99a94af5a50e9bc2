//! Side-effecting actions run on entry into a state.

use super::context::Context;
use super::entity::SharedEntity;
use super::state::State;
use crate::engine::ActionResult;
use std::fmt;
use std::sync::Arc;

type Effect = dyn Fn(&Context, &SharedEntity, &State, &State) -> ActionResult + Send + Sync;

/// Caller-supplied side effect, run with `(ctx, entity, from, to)`.
#[derive(Clone)]
pub struct Action {
    effect: Arc<Effect>,
}

impl Action {
    /// Wrap a closure as an action.
    pub fn new<F>(effect: F) -> Self
    where
        F: Fn(&Context, &SharedEntity, &State, &State) -> ActionResult + Send + Sync + 'static,
    {
        Self {
            effect: Arc::new(effect),
        }
    }

    /// Run the action for a transition from `from` to `to`.
    pub fn run(&self, ctx: &Context, entity: &SharedEntity, from: &State, to: &State) -> ActionResult {
        (self.effect)(ctx, entity, from, to)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Action(..)")
    }
}

/// Action that does nothing and succeeds.
pub fn noop() -> Action {
    Action::new(|_, _, _, _| Ok(()))
}
