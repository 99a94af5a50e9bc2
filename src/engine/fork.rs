//! Fork/join execution of composite entries.

use crate::core::{Context, SharedEntity, State};
use crate::engine::error::{ActionError, ActionResult};
use crate::engine::strategy::{Join, SuccessStrategy};
use crate::engine::transition::Entry;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// How sub-entries are scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// One after another on the caller's thread, honouring early stops.
    Serial,
    /// One detached thread per sub-entry, with no upper bound.
    Parallel,
}

/// Scheduling model paired with the strategy that joins its results.
#[derive(Clone)]
pub struct Executor {
    schedule: Schedule,
    strategy: Arc<dyn SuccessStrategy>,
}

impl Executor {
    /// Run sub-entries one after another on the calling thread.
    pub fn serial(strategy: impl SuccessStrategy + 'static) -> Self {
        Self {
            schedule: Schedule::Serial,
            strategy: Arc::new(strategy),
        }
    }

    /// Run every sub-entry on its own detached thread.
    pub fn parallel(strategy: impl SuccessStrategy + 'static) -> Self {
        Self {
            schedule: Schedule::Parallel,
            strategy: Arc::new(strategy),
        }
    }

    /// How sub-entries are scheduled.
    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Strategy joining sub-entry results.
    pub fn strategy(&self) -> &dyn SuccessStrategy {
        self.strategy.as_ref()
    }

    /// Run `entries` as destinations of a transition leaving `from` and
    /// return the strategy's aggregated outcome.
    pub fn execute(
        &self,
        ctx: &Context,
        entity: &SharedEntity,
        from: &State,
        entries: &[Entry],
    ) -> ActionResult {
        let join = self.strategy.arm(entries);
        match self.schedule {
            Schedule::Serial => {
                for entry in entries {
                    let result = entry.run(ctx, entity, from);
                    if settle(join.as_ref(), entry, result) {
                        break;
                    }
                }
            }
            Schedule::Parallel => {
                for (index, entry) in entries.iter().enumerate() {
                    spawn_task(index, &join, ctx, entity, from, entry);
                }
            }
        }
        join.wait()
    }
}

impl fmt::Display for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.schedule, self.strategy.name())
    }
}

impl fmt::Debug for Executor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Sub-entries of a composite entry and the executor running them.
#[derive(Clone, Debug)]
pub struct Fork {
    entries: Vec<Entry>,
    executor: Executor,
}

impl Fork {
    /// Create a fork running `entries` through `executor`.
    pub fn new(executor: Executor, entries: impl IntoIterator<Item = Entry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            executor,
        }
    }

    /// Sub-entries in registration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Executor scheduling the sub-entries.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Execute every sub-entry and return the joined outcome.
    pub fn run(&self, ctx: &Context, entity: &SharedEntity, from: &State) -> ActionResult {
        self.executor.execute(ctx, entity, from, &self.entries)
    }
}

/// Report one completion. Failures are always logged, even when the
/// strategy tolerates them.
fn settle(join: &dyn Join, entry: &Entry, result: ActionResult) -> bool {
    if let Err(error) = &result {
        tracing::warn!(
            state = %entry.state(),
            error = %error,
            "fork sub-entry failed"
        );
    }
    join.check(result)
}

fn spawn_task(
    index: usize,
    join: &Arc<dyn Join>,
    ctx: &Context,
    entity: &SharedEntity,
    from: &State,
    entry: &Entry,
) {
    let task_join = Arc::clone(join);
    let ctx = ctx.clone();
    let entity = Arc::clone(entity);
    let from = from.clone();
    let task_entry = entry.clone();
    let span = tracing::Span::current();

    let spawned = thread::Builder::new()
        .name(format!("hsm-fork-{index}"))
        .spawn(move || {
            let _entered = span.enter();
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                task_entry.run(&ctx, &entity, &from)
            }))
            .unwrap_or_else(|payload| Err(ActionError::Panicked(panic_message(payload.as_ref()))));
            settle(task_join.as_ref(), &task_entry, result);
        });

    if let Err(error) = spawned {
        let result = Err(ActionError::failed(format!(
            "failed to spawn fork task: {error}"
        )));
        settle(join.as_ref(), entry, result);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
