//! Diagram and snapshot export over linked, possibly cyclic machines.

use hsmkit::builder::{MachineBuilder, TransitionSpec};
use hsmkit::export::{self, ExportError};
use hsmkit::{Executor, Registry, State, StateMachine, Strategy};

/// Machines `a` and `b` whose entries land in each other.
fn cyclic() -> Registry {
    let mut a = StateMachine::new("a", []);
    let mut b = StateMachine::new("b", []);

    let into_a = a.entry(&State::new("S1"), "back to a");
    let into_b = b.entry(&State::new("S2"), "into b");
    a.trans(State::new("S1").exit("E1", ""), into_b);
    b.trans(State::new("S2").exit("E2", ""), into_a);

    let registry = Registry::new();
    registry.register(a).unwrap();
    registry.register(b).unwrap();
    registry
}

#[test]
fn cyclic_links_export_each_machine_once() {
    let registry = cyclic();

    for root in ["a", "b"] {
        let text = export::render(&registry, root).unwrap();
        assert_eq!(text.matches("@startuml").count(), 1);
        assert_eq!(text.matches("[a] state graph").count(), 1);
        assert_eq!(text.matches("[b] state graph").count(), 1);
        assert_eq!(text.matches("a_S1 --> b_S2 : E1<Any> / into b").count(), 1);
        assert_eq!(text.matches("b_S2 --> a_S1 : E2<Any> / back to a").count(), 1);
    }
}

#[test]
fn root_block_comes_first() {
    let text = export::render(&cyclic(), "b").unwrap();
    let b = text.find("[b] state graph").unwrap();
    let a = text.find("[a] state graph").unwrap();
    assert!(b < a);
}

#[test]
fn snapshot_follows_links() {
    let snapshots = export::snapshot(&cyclic(), "a").unwrap();
    let names: Vec<_> = snapshots.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
    assert_eq!(snapshots[0].transitions[0].entry.to.machine(), Some("b"));
}

#[test]
fn built_machines_export_with_forks_and_choices() {
    let registry = Registry::new();
    MachineBuilder::new()
        .transition(
            TransitionSpec::new()
                .from(State::new("WaitPay"))
                .to(State::new("Paying"))
                .on("Pay")
                .when("card", hsmkit::any()),
        )
        .transition(
            TransitionSpec::new()
                .from(State::new("WaitPay"))
                .to(State::new("Cancelled"))
                .on("Pay")
                .when("expired", hsmkit::any()),
        )
        .build(&registry, "orders", [])
        .unwrap();

    let text = export::render(&registry, "orders").unwrap();
    assert!(text.contains("<<choice>>"));
    assert!(text.contains("orders_WaitPay_Pay_choice --> orders_Paying : [card]"));
    assert!(text.contains("orders_WaitPay_Pay_choice --> orders_Cancelled : [expired]"));

    let mut shipping = StateMachine::new("shipping", []);
    shipping.fork(State::new("Paid").exit("Ship", "")).link(
        Executor::serial(Strategy::All),
        [State::new("Packed").entry("pack")],
    );
    registry.register(shipping).unwrap();

    let json = export::to_json(&registry, "shipping").unwrap();
    assert!(json.contains("\"executor\": \"Serial(All)\""));
}

#[test]
fn entries_declared_before_binding_reach_the_owner() {
    let s2 = State::new("S2");

    let mut b = StateMachine::new("b", []);
    b.trans(s2.exit("E2", ""), State::new("S3").entry("leave b"));
    let mut a = StateMachine::new("a", []);
    a.trans(State::new("S1").exit("E1", ""), s2.entry("into b"));

    let registry = Registry::new();
    registry.register(a).unwrap();
    registry.register(b).unwrap();

    let text = export::render(&registry, "a").unwrap();
    assert!(text.contains("[b] state graph"));
    assert!(text.contains("a_S1 --> b_S2 : E1<Any> / into b"));
    assert!(text.contains("b_S2 --> b_S3 : E2<Any> / leave b"));
    assert!(!text.contains("a_S2"));

    let snapshots = export::snapshot(&registry, "a").unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots[0].transitions[0].entry.machine, "b");
}

#[test]
fn unknown_root_fails() {
    let err = export::render(&Registry::new(), "ghost").unwrap_err();
    assert!(matches!(err, ExportError::UnknownMachine(name) if name == "ghost"));
}
