//! Builder turning accumulated transition specs into a published machine.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionSpec;
use crate::engine::{MachineOption, StateMachine};
use crate::registry::Registry;
use std::sync::Arc;
use stillwater::validation::Validation;

/// Collects transition specs and translates them into `trans` calls.
#[derive(Debug, Default)]
pub struct MachineBuilder {
    transitions: Vec<TransitionSpec>,
}

impl MachineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transition spec.
    pub fn transition(mut self, spec: TransitionSpec) -> Self {
        self.transitions.push(spec);
        self
    }

    /// Add several transition specs at once.
    pub fn transitions(mut self, specs: impl IntoIterator<Item = TransitionSpec>) -> Self {
        self.transitions.extend(specs);
        self
    }

    /// Check every spec, reporting all missing fields at once.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.transitions.is_empty() {
            return Err(BuildError::NoTransitions);
        }

        let checks: Vec<_> = self
            .transitions
            .iter()
            .enumerate()
            .flat_map(|(index, spec)| spec.checks(index))
            .collect();

        match Validation::all_vec(checks) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => {
                Err(BuildError::Invalid(errors.iter().cloned().collect()))
            }
        }
    }

    /// Build the machine without publishing it.
    pub fn assemble(
        self,
        id: impl Into<String>,
        options: impl IntoIterator<Item = MachineOption>,
    ) -> Result<StateMachine, BuildError> {
        self.validate()?;

        let mut machine = StateMachine::new(id, options);
        for spec in self.transitions {
            let TransitionSpec {
                from,
                to: Some(to),
                event: Some(event),
                condition,
                action,
            } = spec
            else {
                continue;
            };

            for source in from {
                let exit = match &condition {
                    Some((desc, condition)) => source
                        .exit(event.clone(), desc.as_str())
                        .when(condition.clone()),
                    None => source.exit(event.clone(), ""),
                };
                let entry = match &action {
                    Some((desc, action)) => to.entry(desc.as_str()).action(action.clone()),
                    None => to.entry(""),
                };
                machine.trans(exit, entry);
            }
        }
        Ok(machine)
    }

    /// Build the machine and publish it under `id`.
    pub fn build(
        self,
        registry: &Registry,
        id: impl Into<String>,
        options: impl IntoIterator<Item = MachineOption>,
    ) -> Result<Arc<StateMachine>, BuildError> {
        let machine = self.assemble(id, options)?;
        Ok(registry.register(machine)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SpecError;
    use crate::core::{Action, Condition, Context, Entity, Event, Key, SharedEntity, State};
    use crate::engine::TriggerError;

    struct Order(&'static str);

    impl Entity for Order {
        fn id(&self) -> &str {
            "o-1"
        }

        fn state(&self) -> State {
            State::new(self.0)
        }
    }

    #[test]
    fn builder_requires_transitions() {
        let result = MachineBuilder::new().assemble("orders", []);
        assert!(matches!(result, Err(BuildError::NoTransitions)));
    }

    #[test]
    fn builder_reports_every_invalid_spec() {
        let result = MachineBuilder::new()
            .transition(TransitionSpec::new().from(State::new("Start")).on("Create"))
            .transition(TransitionSpec::new().to(State::new("Paid")).on("Pay"))
            .assemble("orders", []);

        match result {
            Err(BuildError::Invalid(errors)) => assert_eq!(
                errors,
                vec![
                    SpecError::MissingToState { index: 0 },
                    SpecError::MissingFromState { index: 1 },
                ]
            ),
            other => panic!("expected invalid specs, got {:?}", other.map(|m| m.name().to_string())),
        }
    }

    #[test]
    fn every_source_gets_a_linker() {
        let machine = MachineBuilder::new()
            .transition(
                TransitionSpec::new()
                    .from_each([State::new("WaitPay"), State::new("Paying")])
                    .to(State::new("Cancelled"))
                    .on("Cancel")
                    .when("not shipped", Condition::new(|_, _, _, _| true))
                    .action("cancel order", Action::new(|_, _, _, _| Ok(()))),
            )
            .assemble("orders", [])
            .unwrap();

        for source in ["WaitPay", "Paying"] {
            let linkers = machine.linkers(&Key::from(source), &Event::from("Cancel")).unwrap();
            let transition = linkers[0].transition();
            assert_eq!(transition.condition, "not shipped");
            assert_eq!(transition.action, "cancel order");
        }
    }

    #[test]
    fn build_publishes_into_registry() {
        let registry = Registry::new();
        let machine = MachineBuilder::new()
            .transition(
                TransitionSpec::new()
                    .from(State::new("Start"))
                    .to(State::new("WaitPay"))
                    .on("Create"),
            )
            .build(&registry, "orders", [])
            .unwrap();

        let found = registry.get("orders").unwrap();
        assert!(Arc::ptr_eq(&machine, &found));

        let entity: SharedEntity = Arc::new(Order("Start"));
        assert!(found.trigger(&Context::new(), entity, "Create").is_ok());

        let entity: SharedEntity = Arc::new(Order("WaitPay"));
        assert!(matches!(
            found.trigger(&Context::new(), entity, "Create"),
            Err(TriggerError::UnknownState { .. })
        ));
    }

    #[test]
    fn building_the_same_id_twice_fails() {
        let registry = Registry::new();
        let spec = || {
            TransitionSpec::new()
                .from(State::new("Start"))
                .to(State::new("End"))
                .on("Go")
        };
        MachineBuilder::new().transition(spec()).build(&registry, "flow", []).unwrap();

        let again = MachineBuilder::new().transition(spec()).build(&registry, "flow", []);
        assert!(matches!(again, Err(BuildError::Registry(_))));
    }
}
