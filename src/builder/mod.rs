//! Declarative builder for assembling and publishing machines.
//!
//! Transitions are described as plain [`TransitionSpec`] values and
//! translated into [`StateMachine::trans`](crate::StateMachine::trans)
//! calls in a single [`MachineBuilder::build`] step, which also publishes
//! the machine into a [`Registry`](crate::Registry).
//!
//! # Example
//!
//! ```
//! use hsmkit::builder::{MachineBuilder, TransitionSpec};
//! use hsmkit::{Registry, State};
//!
//! let registry = Registry::new();
//! let machine = MachineBuilder::new()
//!     .transition(
//!         TransitionSpec::new()
//!             .from(State::new("Start"))
//!             .to(State::new("WaitPay"))
//!             .on("Create"),
//!     )
//!     .build(&registry, "orders", [])
//!     .unwrap();
//!
//! assert_eq!(machine.name(), "orders");
//! assert!(registry.contains("orders"));
//! ```

pub mod error;
pub mod machine;
pub mod transition;

pub use error::{BuildError, SpecError};
pub use machine::MachineBuilder;
pub use transition::TransitionSpec;
