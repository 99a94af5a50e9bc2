//! Success strategies deciding when a fork is done and what it returns.
//!
//! A strategy arms one [`Join`] per fork execution. Executors report every
//! sub-entry completion through [`Join::check`] and block on [`Join::wait`].
//! Completion is signalled through a [`Latch`] that fires exactly once, no
//! matter how many sub-entries finish concurrently.

use crate::engine::error::{ActionError, ActionResult};
use crate::engine::transition::Entry;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;

/// Completion bookkeeping for one fork execution.
pub trait Join: Send + Sync {
    /// Record one sub-entry's result. Returns `true` when a serial executor
    /// should stop scheduling further sub-entries.
    fn check(&self, result: ActionResult) -> bool;

    /// Block until the completion condition holds, then return the
    /// aggregated outcome.
    fn wait(&self) -> ActionResult;
}

/// Policy producing a fresh [`Join`] for a set of sub-entries.
pub trait SuccessStrategy: Send + Sync {
    fn arm(&self, entries: &[Entry]) -> Arc<dyn Join>;

    fn name(&self) -> &str;
}

/// Built-in completion policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Wait for every sub-entry; fail with a partial failure if any failed.
    All,
    /// Stop at the first failure and return its error.
    AllFast,
    /// Wait for every sub-entry; succeed if at least one succeeded.
    One,
    /// Stop at the first success; fail only if every sub-entry failed.
    OneFast,
    /// Never wait and never fail.
    Always,
}

impl Strategy {
    /// Name used in executor displays.
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::AllFast => "AllFast",
            Self::One => "One",
            Self::OneFast => "OneFast",
            Self::Always => "Always",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SuccessStrategy for Strategy {
    fn arm(&self, entries: &[Entry]) -> Arc<dyn Join> {
        match self {
            Self::Always => Arc::new(AlwaysJoin),
            strategy => Arc::new(TallyJoin::new(*strategy, entries.len())),
        }
    }

    fn name(&self) -> &str {
        Strategy::name(self)
    }
}

/// Single-fire completion signal.
///
/// The first [`fire`](Latch::fire) stores the outcome and wakes every
/// waiter; later calls are ignored.
#[derive(Default)]
pub struct Latch {
    outcome: Mutex<Option<ActionResult>>,
    fired: Condvar,
}

impl Latch {
    /// Create an unfired latch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the latch with `outcome`. Returns `false` if it had already fired.
    pub fn fire(&self, outcome: ActionResult) -> bool {
        let mut slot = self.outcome.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        self.fired.notify_all();
        true
    }

    /// True once an outcome has been stored.
    pub fn is_fired(&self) -> bool {
        self.outcome.lock().is_some()
    }

    /// Block until fired and return the stored outcome.
    pub fn wait(&self) -> ActionResult {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.fired.wait(&mut slot);
        }
    }
}

#[derive(Default)]
struct Tally {
    succeeded: usize,
    failed: usize,
    first_error: Option<ActionError>,
}

struct TallyJoin {
    strategy: Strategy,
    total: usize,
    tally: Mutex<Tally>,
    latch: Latch,
}

impl TallyJoin {
    fn new(strategy: Strategy, total: usize) -> Self {
        let join = Self {
            strategy,
            total,
            tally: Mutex::new(Tally::default()),
            latch: Latch::new(),
        };
        // An empty fork is complete before anything runs.
        if total == 0 {
            let outcome = match strategy {
                Strategy::One | Strategy::OneFast => Err(ActionError::AllFailed { total }),
                _ => Ok(()),
            };
            join.latch.fire(outcome);
        }
        join
    }

    /// Decide `(outcome, stop)` after a completion was counted.
    fn evaluate(&self, tally: &Tally, succeeded: bool) -> (Option<ActionResult>, bool) {
        let done = tally.succeeded + tally.failed >= self.total;
        match self.strategy {
            Strategy::All => {
                let outcome = done.then(|| {
                    if tally.failed == 0 {
                        Ok(())
                    } else {
                        Err(ActionError::PartialFailure {
                            failed: tally.failed,
                            total: self.total,
                        })
                    }
                });
                (outcome, false)
            }
            Strategy::AllFast => {
                if !succeeded {
                    let error = tally
                        .first_error
                        .clone()
                        .unwrap_or(ActionError::AllFailed { total: self.total });
                    (Some(Err(error)), true)
                } else if tally.succeeded == self.total {
                    (Some(Ok(())), false)
                } else {
                    (None, false)
                }
            }
            Strategy::One => {
                let outcome = done.then(|| {
                    if tally.succeeded > 0 {
                        Ok(())
                    } else {
                        Err(ActionError::AllFailed { total: self.total })
                    }
                });
                (outcome, false)
            }
            Strategy::OneFast => {
                if succeeded {
                    (Some(Ok(())), true)
                } else if tally.failed == self.total {
                    (Some(Err(ActionError::AllFailed { total: self.total })), false)
                } else {
                    (None, false)
                }
            }
            Strategy::Always => (None, false),
        }
    }
}

impl Join for TallyJoin {
    fn check(&self, result: ActionResult) -> bool {
        let mut tally = self.tally.lock();
        let succeeded = match result {
            Ok(()) => {
                tally.succeeded += 1;
                true
            }
            Err(error) => {
                tally.failed += 1;
                if tally.first_error.is_none() {
                    tally.first_error = Some(error);
                }
                false
            }
        };
        let (outcome, stop) = self.evaluate(&tally, succeeded);
        drop(tally);

        if let Some(outcome) = outcome {
            self.latch.fire(outcome);
        }
        stop
    }

    fn wait(&self) -> ActionResult {
        self.latch.wait()
    }
}

struct AlwaysJoin;

impl Join for AlwaysJoin {
    fn check(&self, _result: ActionResult) -> bool {
        false
    }

    fn wait(&self) -> ActionResult {
        Ok(())
    }
}
