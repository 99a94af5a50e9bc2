//! State machine owning a transition table and dispatching events.

use crate::core::{Action, Context, Event, Key, SharedEntity, State, TERMINAL};
use crate::engine::error::TriggerError;
use crate::engine::filter::{Filter, NoopFilter};
use crate::engine::fork::{Executor, Fork};
use crate::engine::locker::{LockGuard, LockerFactory};
use crate::engine::transition::{ConditionLinker, Entry, Exit};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// Construction-time configuration of a [`StateMachine`].
#[derive(Clone)]
pub enum MachineOption {
    /// Take a per-entity lock for the guarded part of every trigger.
    Locker(Arc<dyn LockerFactory>),
    /// Wrap every trigger with a before/after filter.
    Aspect(Arc<dyn Filter>),
}

/// Option taking a per-entity lock from `factory` on every trigger.
pub fn locker<L: LockerFactory + 'static>(factory: Arc<L>) -> MachineOption {
    MachineOption::Locker(factory)
}

/// Option wrapping every trigger with `filter`.
pub fn aspect<F: Filter + 'static>(filter: Arc<F>) -> MachineOption {
    MachineOption::Aspect(filter)
}

type EventTable = IndexMap<Event, Vec<ConditionLinker>>;

/// Automaton driving external entities through guarded transitions.
///
/// The machine is assembled through `&mut self` methods and then shared
/// read-only, usually by publishing it into a [`Registry`](crate::Registry).
/// Entries may land on states of other machines; those links are kept as
/// machine names, never as references.
///
/// # Example
///
/// ```rust
/// use hsmkit::{Action, Context, Entity, SharedEntity, State, StateMachine};
/// use std::sync::Arc;
///
/// struct Order;
///
/// impl Entity for Order {
///     fn id(&self) -> &str {
///         "order-1"
///     }
///
///     fn state(&self) -> State {
///         State::new("Start")
///     }
/// }
///
/// let mut machine = StateMachine::new("orders", []);
/// let start = machine.state("Start");
/// let wait_pay = machine.state("WaitPay");
///
/// let exit = start.exit("Create", "");
/// let entry = wait_pay.entry("create order").action(Action::new(|_, _, _, to| {
///     assert_eq!(to, &State::new("WaitPay"));
///     Ok(())
/// }));
/// machine.trans(exit, entry);
///
/// let order: SharedEntity = Arc::new(Order);
/// machine.trigger(&Context::new(), order, "Create").unwrap();
/// ```
pub struct StateMachine {
    name: String,
    states: IndexMap<Key, State>,
    transitions: IndexMap<Key, EventTable>,
    starts: IndexSet<State>,
    ends: IndexSet<State>,
    locker: Option<Arc<dyn LockerFactory>>,
    filter: Arc<dyn Filter>,
}

impl StateMachine {
    /// Create a machine; without options it takes no locks and uses
    /// [`NoopFilter`].
    pub fn new(name: impl Into<String>, options: impl IntoIterator<Item = MachineOption>) -> Self {
        let mut machine = Self {
            name: name.into(),
            states: IndexMap::new(),
            transitions: IndexMap::new(),
            starts: IndexSet::new(),
            ends: IndexSet::new(),
            locker: None,
            filter: Arc::new(NoopFilter),
        };
        for option in options {
            match option {
                MachineOption::Locker(factory) => machine.locker = Some(factory),
                MachineOption::Aspect(filter) => machine.filter = filter,
            }
        }
        machine
    }

    /// Name the machine is registered and linked under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `state` under its key and stamp it with this machine's name.
    ///
    /// Binding overwrites: the last machine to bind a state owns it.
    pub fn bind(&mut self, state: State) -> State {
        let bound = state.bound_to(&self.name);
        self.states.insert(bound.id().clone(), bound.clone());
        bound
    }

    /// Look up a registered state or create and bind a new one.
    pub fn state(&mut self, id: impl Into<Key>) -> State {
        let key = id.into();
        match self.states.get(&key) {
            Some(state) => state.clone(),
            None => self.bind(State::new(key)),
        }
    }

    /// Append a `(exit, entry)` linker under the exit's state and event.
    ///
    /// The exit's state is bound here. The entry may target any machine.
    pub fn trans(&mut self, exit: Exit, entry: Entry) {
        let from = self.bind(exit.state().clone());
        let exit = exit.with_state(from);
        tracing::trace!(
            machine = %self.name,
            from = %exit.state(),
            event = %exit.event(),
            to = %entry.state(),
            "registering transition"
        );
        self.transitions
            .entry(exit.state().id().clone())
            .or_default()
            .entry(exit.event().clone())
            .or_default()
            .push(ConditionLinker::new(exit, entry));
    }

    /// Bind `state` as an entry point of this machine and start an entry into it.
    pub fn entry(&mut self, state: &State, desc: impl Into<String>) -> Entry {
        let bound = self.bind(state.clone());
        self.starts.insert(bound.clone());
        Entry::new(bound, desc)
    }

    /// Bind `state` as an exit point of this machine and start an exit from it.
    pub fn exit(&mut self, state: &State, event: impl Into<Event>, desc: impl Into<String>) -> Exit {
        let bound = self.bind(state.clone());
        self.ends.insert(bound.clone());
        Exit::new(bound, event, desc)
    }

    /// Link `exit` to the terminal state `[*]`, running `actions` on the way.
    pub fn end(&mut self, exit: Exit, actions: impl IntoIterator<Item = Action>) {
        let terminal = self.state(TERMINAL);
        self.trans(exit, Entry::new(terminal, "end").actions(actions));
    }

    /// Start a fork/join composite on `exit`.
    pub fn fork(&mut self, exit: Exit) -> ForkBuilder<'_> {
        ForkBuilder {
            machine: self,
            exit,
        }
    }

    /// Bound states in binding order.
    pub fn states(&self) -> impl Iterator<Item = &State> {
        self.states.values()
    }

    /// Bound state with this key, if any.
    pub fn state_of(&self, key: &Key) -> Option<&State> {
        self.states.get(key)
    }

    /// States bound through [`StateMachine::entry`].
    pub fn starts(&self) -> impl Iterator<Item = &State> {
        self.starts.iter()
    }

    /// States bound through [`StateMachine::exit`].
    pub fn ends(&self) -> impl Iterator<Item = &State> {
        self.ends.iter()
    }

    /// Every `(state, event)` bucket in registration order.
    pub fn transitions(&self) -> impl Iterator<Item = (&Key, &Event, &[ConditionLinker])> {
        self.transitions.iter().flat_map(|(state, events)| {
            events
                .iter()
                .map(move |(event, linkers)| (state, event, linkers.as_slice()))
        })
    }

    /// Linkers registered for `(state, event)`, in registration order.
    pub fn linkers(&self, state: &Key, event: &Event) -> Option<&[ConditionLinker]> {
        self.transitions
            .get(state)
            .and_then(|events| events.get(event))
            .map(Vec::as_slice)
    }

    /// Names of other machines that entries of this machine land in.
    pub fn linked_machines(&self) -> Vec<String> {
        let mut linked = IndexSet::new();
        for (_, _, linkers) in self.transitions() {
            for linker in linkers {
                collect_links(linker.entry(), &self.name, &mut linked);
            }
        }
        linked.into_iter().collect()
    }

    /// Dispatch `event` for `entity`.
    ///
    /// Looks up the entity's current state and the event, takes the
    /// per-entity lock, runs the `before` filter, selects the first linker
    /// whose guard passes, runs its entry and reports the outcome to the
    /// `after` filter. Lookup and guard failures return before any action
    /// or `after` call.
    pub fn trigger(
        &self,
        ctx: &Context,
        entity: SharedEntity,
        event: impl Into<Event>,
    ) -> Result<(), TriggerError> {
        let event = event.into();
        let current = entity.state();

        let events = self
            .transitions
            .get(current.id())
            .ok_or_else(|| TriggerError::UnknownState {
                machine: self.name.clone(),
                state: current.id().clone(),
            })?;
        let linkers = events
            .get(&event)
            .ok_or_else(|| TriggerError::UnknownEvent {
                machine: self.name.clone(),
                state: current.id().clone(),
                event: event.clone(),
            })?;

        let _lock = self
            .locker
            .as_ref()
            .map(|factory| LockGuard::acquire(factory.locker(entity.id())));

        let entity = self.filter.before(ctx, entity, &event);

        let linker = linkers
            .iter()
            .find(|linker| {
                let allowed = linker.allows(ctx, &entity);
                if !allowed {
                    tracing::debug!(
                        machine = %self.name,
                        transition = %linker.transition(),
                        "guard rejected transition"
                    );
                }
                allowed
            })
            .ok_or_else(|| TriggerError::NoMatchingGuard {
                machine: self.name.clone(),
                state: current.id().clone(),
                event: event.clone(),
            })?;

        tracing::debug!(
            machine = %self.name,
            entity = entity.id(),
            transition = %linker.transition(),
            "running transition"
        );
        let result = linker.entry().run(ctx, &entity, linker.exit().state());
        self.filter
            .after(ctx, &entity, &linker.transition(), result.as_ref().map(|_| ()));

        result.map_err(TriggerError::from)
    }
}

fn collect_links(entry: &Entry, own: &str, linked: &mut IndexSet<String>) {
    if let Some(machine) = entry.state().machine() {
        if machine != own {
            linked.insert(machine.to_string());
        }
    }
    if let Some(fork) = entry.fork() {
        for sub in fork.entries() {
            collect_links(sub, own, linked);
        }
    }
}

/// Pending fork on one exit; finished by [`ForkBuilder::link`].
pub struct ForkBuilder<'a> {
    machine: &'a mut StateMachine,
    exit: Exit,
}

impl ForkBuilder<'_> {
    /// Register a composite entry running `entries` through `executor`.
    ///
    /// The composite lands on a `fork` pseudo-state named
    /// `{state}_{event}_fork`.
    pub fn link(self, executor: Executor, entries: impl IntoIterator<Item = Entry>) {
        let id = format!("{}_{}_fork", self.exit.state().id(), self.exit.event());
        let fork_state = self.machine.bind(State::new(id).with_stereotype("fork"));
        let entry = Entry::forked(fork_state, Fork::new(executor, entries));
        self.machine.trans(self.exit, entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Condition, Entity};
    use crate::engine::{ActionError, Strategy};
    use parking_lot::Mutex;

    struct Order {
        id: String,
        state: Mutex<State>,
    }

    impl Order {
        fn shared(id: &str, state: &str) -> Arc<Order> {
            Arc::new(Order {
                id: id.to_string(),
                state: Mutex::new(State::new(state)),
            })
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

    #[test]
    fn trans_binds_exit_state() {
        let mut machine = StateMachine::new("orders", []);
        machine.trans(State::new("Start").exit("Create", ""), State::new("WaitPay").entry(""));

        let start = machine.state_of(&Key::from("Start")).unwrap();
        assert_eq!(start.machine(), Some("orders"));
        assert!(machine.state_of(&Key::from("WaitPay")).is_none());
    }

    #[test]
    fn state_returns_registered_value() {
        let mut machine = StateMachine::new("orders", []);
        let tagged = machine.bind(State::new("Review").with_stereotype("manual"));
        let found = machine.state("Review");

        assert_eq!(found, tagged);
        assert_eq!(found.stereotype(), Some("manual"));
        assert_eq!(machine.states().count(), 1);
    }

    #[test]
    fn entry_and_exit_record_start_and_end_states() {
        let mut machine = StateMachine::new("payments", []);
        let paying = State::new("Paying");
        let paid = State::new("Paid");

        let entry = machine.entry(&paying, "start paying");
        machine.entry(&paying, "again");
        let exit = machine.exit(&paid, "Done", "");

        assert_eq!(entry.state().machine(), Some("payments"));
        assert_eq!(exit.state().machine(), Some("payments"));
        assert_eq!(machine.starts().collect::<Vec<_>>(), vec![&paying]);
        assert_eq!(machine.ends().collect::<Vec<_>>(), vec![&paid]);
    }

    #[test]
    fn transitions_preserve_registration_order() {
        let mut machine = StateMachine::new("orders", []);
        let start = State::new("Start");
        machine.trans(start.exit("Create", "first"), State::new("A").entry(""));
        machine.trans(start.exit("Create", "second"), State::new("B").entry(""));
        machine.trans(start.exit("Cancel", ""), State::new("C").entry(""));

        let buckets: Vec<_> = machine
            .transitions()
            .map(|(state, event, linkers)| (state.to_string(), event.to_string(), linkers.len()))
            .collect();
        assert_eq!(
            buckets,
            vec![
                ("Start".to_string(), "Create".to_string(), 2),
                ("Start".to_string(), "Cancel".to_string(), 1),
            ]
        );

        let linkers = machine.linkers(&Key::from("Start"), &Event::from("Create")).unwrap();
        assert_eq!(linkers[0].exit().desc(), "first");
        assert_eq!(linkers[1].exit().desc(), "second");
    }

    #[test]
    fn end_links_to_terminal_state() {
        let mut machine = StateMachine::new("orders", []);
        let exit = State::new("Done").exit("Close", "");
        machine.end(exit, []);

        let linkers = machine.linkers(&Key::from("Done"), &Event::from("Close")).unwrap();
        assert!(linkers[0].entry().state().is_terminal());
        assert_eq!(linkers[0].entry().desc(), "end");

        let order = Order::shared("o-1", "Done");
        assert!(machine.trigger(&Context::new(), order, "Close").is_ok());
    }

    #[test]
    fn fork_registers_pseudo_state() {
        let mut machine = StateMachine::new("orders", []);
        let exit = State::new("Paid").exit("Ship", "");
        machine
            .fork(exit)
            .link(Executor::serial(Strategy::All), [State::new("Packed").entry("")]);

        let fork_state = machine.state_of(&Key::from("Paid_Ship_fork")).unwrap();
        assert_eq!(fork_state.stereotype(), Some("fork"));

        let linkers = machine.linkers(&Key::from("Paid"), &Event::from("Ship")).unwrap();
        let fork = linkers[0].entry().fork().unwrap();
        assert_eq!(fork.entries().len(), 1);
        assert_eq!(linkers[0].entry().desc(), "Fork");
    }

    #[test]
    fn trigger_runs_matching_action() {
        let mut machine = StateMachine::new("orders", []);
        let order = Order::shared("o-1", "Start");
        let target = Arc::clone(&order);
        machine.trans(
            State::new("Start").exit("Create", ""),
            State::new("WaitPay").entry("create").action(Action::new(move |_, _, _, to| {
                *target.state.lock() = to.clone();
                Ok(())
            })),
        );

        machine.trigger(&Context::new(), order.clone(), "Create").unwrap();
        assert_eq!(order.state(), State::new("WaitPay"));
    }

    #[test]
    fn trigger_distinguishes_lookup_failures() {
        let mut machine = StateMachine::new("orders", []);
        machine.trans(
            State::new("Start").exit("Create", "").when(Condition::new(|_, _, _, _| false)),
            State::new("WaitPay").entry(""),
        );

        let lost = machine.trigger(&Context::new(), Order::shared("o-1", "Lost"), "Create");
        assert!(matches!(lost, Err(TriggerError::UnknownState { .. })));

        let unknown = machine.trigger(&Context::new(), Order::shared("o-1", "Start"), "Pay");
        assert!(matches!(unknown, Err(TriggerError::UnknownEvent { .. })));

        let rejected = machine.trigger(&Context::new(), Order::shared("o-1", "Start"), "Create");
        assert!(matches!(rejected, Err(TriggerError::NoMatchingGuard { .. })));
    }

    #[test]
    fn action_errors_surface_verbatim() {
        let mut machine = StateMachine::new("orders", []);
        machine.trans(
            State::new("Start").exit("Create", ""),
            State::new("WaitPay")
                .entry("")
                .action(Action::new(|_, _, _, _| Err(ActionError::failed("out of stock")))),
        );

        let result = machine.trigger(&Context::new(), Order::shared("o-1", "Start"), "Create");
        assert_eq!(
            result,
            Err(TriggerError::Action(ActionError::failed("out of stock")))
        );
    }

    #[test]
    fn linked_machines_follow_entries_and_forks() {
        let mut payments = StateMachine::new("payments", []);
        let mut shipping = StateMachine::new("shipping", []);
        let paying = payments.entry(&State::new("Paying"), "");
        let packing = shipping.entry(&State::new("Packing"), "");

        let mut orders = StateMachine::new("orders", []);
        orders.trans(State::new("WaitPay").exit("Pay", ""), paying);
        let exit = State::new("Paid").exit("Ship", "");
        orders.fork(exit).link(
            Executor::parallel(Strategy::All),
            [packing, State::new("Notified").entry("")],
        );

        assert_eq!(orders.linked_machines(), vec!["payments", "shipping"]);
    }
}
