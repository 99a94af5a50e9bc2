//! Shared fixtures for integration tests.

#![allow(dead_code)]

use hsmkit::{Action, ActionError, Entity, SharedEntity, State};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Entity whose state is moved by test actions.
pub struct Order {
    pub id: String,
    pub state: Mutex<State>,
}

impl Order {
    pub fn new(id: &str, state: impl Into<hsmkit::Key>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            state: Mutex::new(State::new(state)),
        })
    }

    pub fn shared(self: &Arc<Self>) -> SharedEntity {
        Arc::clone(self) as SharedEntity
    }
}

impl Entity for Order {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> State {
        self.state.lock().clone()
    }
}

/// Action moving `order` to the entry's destination.
pub fn move_to(order: &Arc<Order>) -> Action {
    let order = Arc::clone(order);
    Action::new(move |_, _, _, to| {
        *order.state.lock() = to.clone();
        Ok(())
    })
}

/// Action counting its runs and succeeding or failing with `message`.
pub fn counted(counter: &Arc<AtomicUsize>, failure: Option<&str>) -> Action {
    let counter = Arc::clone(counter);
    let failure = failure.map(str::to_string);
    Action::new(move |_, _, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        match &failure {
            Some(message) => Err(ActionError::failed(message.clone())),
            None => Ok(()),
        }
    })
}

/// Action returning `Ok(())` or an error named after the destination.
pub fn outcome(ok: bool) -> Action {
    Action::new(move |_, _, _, to| {
        if ok {
            Ok(())
        } else {
            Err(ActionError::failed(format!("{to} failed")))
        }
    })
}
