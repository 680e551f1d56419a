//! The output environment the differ mutates.

use crate::{error::HostError, node::Callback, node::CallbackId};
use core::fmt::{self, Display, Formatter};

/// Names one output (element, text node or container) owned by a [`Host`].
///
/// Holding an id doesn't keep the output alive. Hosts never reuse ids, so a stale id can only ever resolve to nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputId(u64);

impl OutputId {
	#[must_use]
	pub const fn new(raw: u64) -> Self {
		Self(raw)
	}

	#[must_use]
	pub const fn get(self) -> u64 {
		self.0
	}
}

impl Display for OutputId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Key of one live event binding.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListenerKey {
	pub output: OutputId,
	pub event: String,
	pub callback: CallbackId,
}

impl ListenerKey {
	#[must_use]
	pub fn new(output: OutputId, event: &str, callback: &Callback) -> Self {
		Self {
			output,
			event: event.to_owned(),
			callback: callback.id(),
		}
	}
}

/// An output tree the differ can materialize nodes into.
///
/// Mutations apply immediately: a query right after a mutation must observe it.
pub trait Host {
	fn create_element(&mut self, tag: &str) -> Result<OutputId, HostError>;
	fn create_text(&mut self, text: &str) -> Result<OutputId, HostError>;
	fn set_text(&mut self, output: OutputId, text: &str) -> Result<(), HostError>;

	fn set_attribute(&mut self, output: OutputId, name: &str, value: &str) -> Result<(), HostError>;
	fn remove_attribute(&mut self, output: OutputId, name: &str) -> Result<(), HostError>;

	/// Binds `callback` to `event` on `output`. Binding the same callback twice needs two removals.
	fn add_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError>;
	fn remove_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError>;

	/// Inserts `child` into `parent` before `before`, or last if that's [`None`].
	///
	/// A `child` that already has a parent is moved.
	fn insert_before(&mut self, parent: OutputId, child: OutputId, before: Option<OutputId>) -> Result<(), HostError>;
	fn remove_child(&mut self, parent: OutputId, child: OutputId) -> Result<(), HostError>;
	fn clear_children(&mut self, container: OutputId) -> Result<(), HostError>;

	/// The current payload of a text output, [`None`] for anything else.
	fn text(&self, output: OutputId) -> Option<String>;

	fn parent(&self, output: OutputId) -> Option<OutputId>;
	fn next_sibling(&self, output: OutputId) -> Option<OutputId>;

	/// Whether `output`'s parent chain reaches the host root.
	fn is_connected(&self, output: OutputId) -> bool;

	fn accepts_children(&self, output: OutputId) -> bool;

	/// Whether the host still knows `output` at all.
	fn contains(&self, output: OutputId) -> bool;

	/// Called once at the end of each render.
	fn finish_cycle(&mut self) {}
}

/// Read access to existing outputs, for [`load`](`crate::load`).
pub trait Inspect: Host {
	/// [`None`] for text nodes.
	fn tag_name(&self, output: OutputId) -> Option<String>;
	fn attributes(&self, output: OutputId) -> Vec<(String, String)>;
	fn child_outputs(&self, output: OutputId) -> Vec<OutputId>;
}
