//! Build errors for the declarative machine builder.

use crate::registry::RegistryError;
use thiserror::Error;

/// Problem with one accumulated transition spec.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("transition #{index}: source state not specified. Call .from(state)")]
    MissingFromState { index: usize },

    #[error("transition #{index}: target state not specified. Call .to(state)")]
    MissingToState { index: usize },

    #[error("transition #{index}: event not specified. Call .on(event)")]
    MissingEvent { index: usize },
}

/// Errors that can occur when building a machine from specs.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("No transitions defined. Add at least one transition")]
    NoTransitions,

    #[error("{} invalid transition field(s): {}", .0.len(), describe(.0))]
    Invalid(Vec<SpecError>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

fn describe(errors: &[SpecError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
