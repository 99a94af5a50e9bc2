//! Order Processing
//!
//! This example walks one order through two linked machines.
//!
//! Key concepts:
//! - Entities keep their own state; actions move them along
//! - Guarded alternatives on the same event (first match wins)
//! - An entry landing in another machine, routed through the registry
//! - A parallel fork joined with the `All` strategy
//! - Per-entity locking and a history filter
//!
//! Run with: cargo run --example order_processing

use hsmkit::engine::{EntityLockers, HistoryFilter};
use hsmkit::export;
use hsmkit::{
    aspect, locker, Action, Condition, Context, Entity, Executor, Registry, SharedEntity, State,
    StateMachine, Strategy, TriggerError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

// Where every order currently is
#[derive(Default)]
struct Ledger {
    states: Mutex<HashMap<String, State>>,
}

impl Ledger {
    fn open(self: &Arc<Self>, id: &str) -> SharedEntity {
        self.states.lock().insert(id.to_string(), State::new("Start"));
        Arc::new(Order {
            id: id.to_string(),
            ledger: Arc::clone(self),
        })
    }

    fn move_to(&self, id: &str, state: &State) {
        self.states.lock().insert(id.to_string(), state.clone());
    }
}

struct Order {
    id: String,
    ledger: Arc<Ledger>,
}

impl Entity for Order {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> State {
        self.ledger
            .states
            .lock()
            .get(&self.id)
            .cloned()
            .unwrap_or_else(|| State::new("Start"))
    }
}

fn advance(ledger: &Arc<Ledger>) -> Action {
    let ledger = Arc::clone(ledger);
    Action::new(move |_, entity, from, to| {
        println!("  {}: {} -> {}", entity.id(), from, to);
        ledger.move_to(entity.id(), to);
        Ok(())
    })
}

fn log(message: &'static str) -> Action {
    Action::new(move |_, entity, _, _| {
        println!("  {}: {}", entity.id(), message);
        Ok(())
    })
}

fn approved() -> Condition {
    Condition::new(|ctx, _, _, _| {
        ctx.value("approved")
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    })
}

/// Send `event` to whichever machine owns the entity's current state.
fn dispatch(
    registry: &Registry,
    ctx: &Context,
    order: &SharedEntity,
    event: &str,
) -> Result<(), TriggerError> {
    let state = order.state();
    let name = state.machine().unwrap_or("orders");
    let machine = registry.get(name).ok_or_else(|| TriggerError::UnknownState {
        machine: name.to_string(),
        state: state.id().clone(),
    })?;
    println!("[{}] {} on {}", machine.name(), event, state);
    machine.trigger(ctx, Arc::clone(order), event)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Order Processing ===\n");

    let ledger = Arc::new(Ledger::default());
    let history = Arc::new(HistoryFilter::new());
    let lockers = Arc::new(EntityLockers::new());

    let mut orders = StateMachine::new(
        "orders",
        [locker(Arc::clone(&lockers)), aspect(Arc::clone(&history))],
    );
    let mut payments = StateMachine::new("payments", [locker(lockers)]);

    let paying = payments
        .entry(&State::new("Paying"), "start payment")
        .action(advance(&ledger));
    let paid = orders
        .entry(&State::new("Paid"), "payment approved")
        .action(advance(&ledger));
    let retry = orders
        .entry(&State::new("WaitPay"), "payment declined")
        .action(advance(&ledger));

    let start = orders.state("Start");
    let wait_pay = orders.state("WaitPay");
    orders.trans(
        start.exit("Create", ""),
        wait_pay.entry("create order").action(advance(&ledger)),
    );
    orders.trans(wait_pay.exit("Pay", ""), paying);

    let exit = orders.state("Paid").exit("Ship", "");
    orders.fork(exit).link(
        Executor::parallel(Strategy::All),
        [
            State::new("Shipped")
                .entry("pack and ship")
                .action(advance(&ledger)),
            State::new("Invoiced")
                .entry("send invoice")
                .action(log("invoice sent")),
        ],
    );
    let shipped = orders.state("Shipped");
    orders.end(shipped.exit("Close", ""), [log("order closed")]);

    let paying = payments.state("Paying");
    payments.trans(paying.exit("Confirm", "approved").when(approved()), paid);
    payments.trans(paying.exit("Confirm", "declined"), retry);

    let registry = Registry::new();
    registry.register(orders)?;
    registry.register(payments)?;

    let order = ledger.open("order-1001");
    let rejected = Context::new().with_value("approved", false);
    let accepted = Context::new().with_value("approved", true);

    dispatch(&registry, &Context::new(), &order, "Create")?;
    dispatch(&registry, &Context::new(), &order, "Pay")?;
    dispatch(&registry, &rejected, &order, "Confirm")?;
    dispatch(&registry, &Context::new(), &order, "Pay")?;
    dispatch(&registry, &accepted, &order, "Confirm")?;
    dispatch(&registry, &Context::new(), &order, "Ship")?;

    match dispatch(&registry, &Context::new(), &order, "Refund") {
        Err(error) => println!("  rejected: {error}"),
        Ok(()) => println!("  unexpected refund"),
    }

    dispatch(&registry, &Context::new(), &order, "Close")?;

    println!("\n=== History (orders machine) ===");
    for record in history.records_for(order.id()) {
        println!("  {} at {}", record.transition, record.timestamp);
    }

    println!("\n=== Diagram ===");
    print!("{}", export::render(&registry, "orders")?);

    Ok(())
}
