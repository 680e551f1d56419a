use crate::host::OutputId;
use thiserror::Error;

/// Failure of a single [`Host`](`crate::host::Host`) operation.
///
/// The differ never propagates these. It logs them and carries on with the next mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
	#[error("unknown output {0}")]
	UnknownOutput(OutputId),

	#[error("output {0} can't hold children")]
	NotAContainer(OutputId),

	#[error("output {output} is not {expected}")]
	WrongKind { output: OutputId, expected: &'static str },

	#[error("output {child} is not a child of {parent}")]
	NotAChild { parent: OutputId, child: OutputId },

	#[error("inserting {child} into {parent} would create a cycle")]
	HierarchyRequest { parent: OutputId, child: OutputId },

	#[error("no {event:?} listener bound on {output} for this callback")]
	UnknownListener { output: OutputId, event: String },

	#[error("too many (more than 65k) active bindings of the same callback")]
	TooManyBindings,

	#[error("JavaScript error: {0}")]
	Js(String),
}

/// Errors reported by [`Renderer`](`crate::Renderer`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	#[error("invalid render container {0}: it can't accept child insertion")]
	InvalidContainer(OutputId),

	#[error(transparent)]
	Host(#[from] HostError),
}
