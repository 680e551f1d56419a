//! An in-memory output tree with a mutation journal.
//!
//! Useful for headless rendering (bots, replays) and for observing exactly which mutations a render performs.

use crate::{
	error::HostError,
	host::{Host, Inspect, ListenerKey, OutputId},
	node::Callback,
	rc_hash_map::{CountSaturatedError, RcHashMap},
};
use core::{any::Any, fmt::Write as _};
use hashbrown::{HashMap, HashSet};
use indexmap::IndexMap;
use tracing::trace;

/// One mutating [`Host`] call on an [`ArenaHost`], in the order it happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
	CreateElement { output: OutputId, tag: String },
	CreateText { output: OutputId, text: String },
	SetText { output: OutputId, text: String },
	SetAttribute { output: OutputId, name: String, value: String },
	RemoveAttribute { output: OutputId, name: String },
	AddListener { output: OutputId, event: String },
	RemoveListener { output: OutputId, event: String },
	Insert { parent: OutputId, child: OutputId, before: Option<OutputId> },
	Remove { parent: OutputId, child: OutputId },
	Clear { container: OutputId },
}

#[derive(Debug)]
enum Kind {
	Root,
	Element { tag: String, attributes: IndexMap<String, String> },
	Text(String),
}

#[derive(Debug)]
struct Slot {
	kind: Kind,
	parent: Option<OutputId>,
	children: Vec<OutputId>,
}

/// A [`Host`] backed by a plain arena of output nodes.
///
/// Output `#0` is the root (the document). [`Host::is_connected`] means "reachable from the root".
///
/// At the end of each render, outputs that are neither connected nor inside a container from [`ArenaHost::create_container`]
/// are discarded along with their listeners.
#[derive(Debug)]
pub struct ArenaHost {
	slots: HashMap<OutputId, Slot>,
	containers: HashSet<OutputId>,
	next_id: u64,
	listeners: RcHashMap<ListenerKey, u16, Callback>,
	journal: Vec<Mutation>,
}

impl Default for ArenaHost {
	fn default() -> Self {
		Self::new()
	}
}

impl ArenaHost {
	#[must_use]
	pub fn new() -> Self {
		let mut slots = HashMap::new();
		slots.insert(
			OutputId::new(0),
			Slot {
				kind: Kind::Root,
				parent: None,
				children: Vec::new(),
			},
		);
		Self {
			slots,
			containers: HashSet::new(),
			next_id: 1,
			listeners: RcHashMap::new(),
			journal: Vec::new(),
		}
	}

	#[must_use]
	pub fn root(&self) -> OutputId {
		OutputId::new(0)
	}

	/// Creates a `<div>` attached to the root, for use as a render container.
	///
	/// # Errors
	///
	/// Never, in practice. The signature mirrors the [`Host`] calls it's made of.
	pub fn create_container(&mut self) -> Result<OutputId, HostError> {
		let container = self.create_element("div")?;
		self.insert_before(self.root(), container, None)?;
		self.containers.insert(container);
		Ok(container)
	}

	/// Discards `output` and all of its descendants, as their owner would when it's done with them.
	///
	/// Their ids stay invalid afterwards.
	pub fn release(&mut self, output: OutputId) {
		if let Some(parent) = self.parent(output) {
			if let Some(slot) = self.slot_mut(parent) {
				slot.children.retain(|child| *child != output);
			}
		}

		let mut released = HashSet::new();
		let mut pending = vec![output];
		while let Some(next) = pending.pop() {
			if let Some(slot) = self.slots.remove(&next) {
				pending.extend(slot.children);
				released.insert(next);
			}
		}
		self.forget(&released);
	}

	fn forget(&mut self, released: &HashSet<OutputId>) {
		self.containers.retain(|container| !released.contains(container));
		let dropped = self.listeners.remove_where(|key, _| released.contains(&key.output)).len();
		trace!("Released {} output(s) and {} listener binding(s).", released.len(), dropped);
	}

	/// Whether `output` is connected or inside a container.
	fn is_retained(&self, mut output: OutputId) -> bool {
		loop {
			if output == self.root() || self.containers.contains(&output) {
				return true;
			}
			match self.parent(output) {
				Some(parent) => output = parent,
				None => return false,
			}
		}
	}

	/// Removes `output` from its parent behind the differ's back.
	pub fn detach(&mut self, output: OutputId) -> Result<(), HostError> {
		match self.parent(output) {
			Some(parent) => self.remove_child(parent, output),
			None => Ok(()),
		}
	}

	/// Fires `event` at `target`, bubbling up through its ancestors.
	///
	/// Returns the number of listeners called.
	pub fn dispatch(&self, target: OutputId, event: &str, payload: &dyn Any) -> usize {
		let mut called = 0;
		let mut current = Some(target);
		while let Some(output) = current {
			let callbacks: Vec<Callback> = self
				.listeners
				.iter_strong()
				.filter(|(key, _)| key.output == output && key.event == event)
				.map(|(_, callback)| callback.clone())
				.collect();
			for callback in callbacks {
				callback.call(payload);
				called += 1;
			}
			current = self.parent(output);
		}
		called
	}

	#[must_use]
	pub fn mutations(&self) -> &[Mutation] {
		&self.journal
	}

	pub fn take_mutations(&mut self) -> Vec<Mutation> {
		std::mem::take(&mut self.journal)
	}

	#[must_use]
	pub fn tag(&self, output: OutputId) -> Option<&str> {
		match &self.slot(output)?.kind {
			Kind::Element { tag, .. } => Some(tag.as_str()),
			Kind::Root | Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn text_of(&self, output: OutputId) -> Option<&str> {
		match &self.slot(output)?.kind {
			Kind::Text(text) => Some(text.as_str()),
			Kind::Root | Kind::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, output: OutputId, name: &str) -> Option<&str> {
		match &self.slot(output)?.kind {
			Kind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
			Kind::Root | Kind::Text(_) => None,
		}
	}

	#[must_use]
	pub fn children(&self, output: OutputId) -> &[OutputId] {
		self.slot(output).map_or(&[][..], |slot| slot.children.as_slice())
	}

	/// Number of live bindings of `event` on `output`.
	#[must_use]
	pub fn listener_count(&self, output: OutputId, event: &str) -> usize {
		self.listeners
			.iter_strong()
			.filter(|(key, _)| key.output == output && key.event == event)
			.count()
	}

	/// Serializes the subtree at `output` as HTML, without listeners.
	#[must_use]
	pub fn to_html(&self, output: OutputId) -> String {
		let mut html = String::new();
		self.write_html(output, &mut html);
		html
	}

	fn write_html(&self, output: OutputId, html: &mut String) {
		let slot = match self.slot(output) {
			Some(slot) => slot,
			None => return,
		};
		match &slot.kind {
			Kind::Text(text) => html.push_str(&escape(text, false)),
			Kind::Root => {
				for child in &slot.children {
					self.write_html(*child, html)
				}
			}
			Kind::Element { tag, attributes } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					let _ = write!(html, " {}=\"{}\"", name, escape(value, true));
				}
				html.push('>');
				for child in &slot.children {
					self.write_html(*child, html)
				}
				let _ = write!(html, "</{}>", tag);
			}
		}
	}

	fn slot(&self, output: OutputId) -> Option<&Slot> {
		self.slots.get(&output)
	}

	fn slot_mut(&mut self, output: OutputId) -> Option<&mut Slot> {
		self.slots.get_mut(&output)
	}

	fn existing(&mut self, output: OutputId) -> Result<&mut Slot, HostError> {
		self.slot_mut(output).ok_or(HostError::UnknownOutput(output))
	}

	fn attributes_mut(&mut self, output: OutputId) -> Result<&mut IndexMap<String, String>, HostError> {
		match &mut self.existing(output)?.kind {
			Kind::Element { attributes, .. } => Ok(attributes),
			Kind::Root | Kind::Text(_) => Err(HostError::WrongKind { output, expected: "an element" }),
		}
	}

	fn push(&mut self, kind: Kind) -> OutputId {
		let output = OutputId::new(self.next_id);
		self.next_id += 1;
		self.slots.insert(
			output,
			Slot {
				kind,
				parent: None,
				children: Vec::new(),
			},
		);
		output
	}

	fn is_ancestor_or_self(&self, ancestor: OutputId, mut output: OutputId) -> bool {
		loop {
			if output == ancestor {
				return true;
			}
			match self.parent(output) {
				Some(parent) => output = parent,
				None => return false,
			}
		}
	}
}

fn escape(text: &str, attribute: bool) -> String {
	let mut escaped = String::with_capacity(text.len());
	for c in text.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' if attribute => escaped.push_str("&quot;"),
			c => escaped.push(c),
		}
	}
	escaped
}

impl Host for ArenaHost {
	fn create_element(&mut self, tag: &str) -> Result<OutputId, HostError> {
		let output = self.push(Kind::Element {
			tag: tag.to_owned(),
			attributes: IndexMap::new(),
		});
		self.journal.push(Mutation::CreateElement { output, tag: tag.to_owned() });
		Ok(output)
	}

	fn create_text(&mut self, text: &str) -> Result<OutputId, HostError> {
		let output = self.push(Kind::Text(text.to_owned()));
		self.journal.push(Mutation::CreateText { output, text: text.to_owned() });
		Ok(output)
	}

	fn set_text(&mut self, output: OutputId, text: &str) -> Result<(), HostError> {
		match &mut self.existing(output)?.kind {
			Kind::Text(data) => *data = text.to_owned(),
			Kind::Root | Kind::Element { .. } => return Err(HostError::WrongKind { output, expected: "a text node" }),
		}
		self.journal.push(Mutation::SetText { output, text: text.to_owned() });
		Ok(())
	}

	fn set_attribute(&mut self, output: OutputId, name: &str, value: &str) -> Result<(), HostError> {
		self.attributes_mut(output)?.insert(name.to_owned(), value.to_owned());
		self.journal.push(Mutation::SetAttribute {
			output,
			name: name.to_owned(),
			value: value.to_owned(),
		});
		Ok(())
	}

	fn remove_attribute(&mut self, output: OutputId, name: &str) -> Result<(), HostError> {
		self.attributes_mut(output)?.shift_remove(name);
		self.journal.push(Mutation::RemoveAttribute { output, name: name.to_owned() });
		Ok(())
	}

	fn add_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError> {
		self.attributes_mut(output)?;
		self.listeners
			.increment_or_insert_with(ListenerKey::new(output, event, callback), || callback.clone())
			.map_err(|CountSaturatedError| HostError::TooManyBindings)?;
		self.journal.push(Mutation::AddListener { output, event: event.to_owned() });
		Ok(())
	}

	fn remove_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError> {
		match self.listeners.weak_decrement(&ListenerKey::new(output, event, callback)) {
			Ok(Some(_)) => (),
			Ok(None) | Err(CountSaturatedError) => {
				return Err(HostError::UnknownListener {
					output,
					event: event.to_owned(),
				})
			}
		}
		self.journal.push(Mutation::RemoveListener { output, event: event.to_owned() });
		Ok(())
	}

	fn insert_before(&mut self, parent: OutputId, child: OutputId, before: Option<OutputId>) -> Result<(), HostError> {
		if !self.accepts_children(parent) {
			return Err(HostError::NotAContainer(parent));
		}
		if self.slot(child).is_none() {
			return Err(HostError::UnknownOutput(child));
		}
		if self.is_ancestor_or_self(child, parent) {
			return Err(HostError::HierarchyRequest { parent, child });
		}
		if let Some(before) = before {
			if self.parent(before) != Some(parent) {
				return Err(HostError::NotAChild { parent, child: before });
			}
		}

		if let Some(previous_parent) = self.parent(child) {
			self.existing(previous_parent)?.children.retain(|c| *c != child);
		}
		let siblings = &mut self.existing(parent)?.children;
		let index = before.and_then(|before| siblings.iter().position(|c| *c == before)).unwrap_or(siblings.len());
		siblings.insert(index, child);
		self.existing(child)?.parent = Some(parent);

		self.journal.push(Mutation::Insert { parent, child, before });
		Ok(())
	}

	fn remove_child(&mut self, parent: OutputId, child: OutputId) -> Result<(), HostError> {
		if self.parent(child) != Some(parent) {
			return Err(HostError::NotAChild { parent, child });
		}
		self.existing(parent)?.children.retain(|c| *c != child);
		self.existing(child)?.parent = None;
		self.journal.push(Mutation::Remove { parent, child });
		Ok(())
	}

	fn clear_children(&mut self, container: OutputId) -> Result<(), HostError> {
		let children = std::mem::take(&mut self.existing(container)?.children);
		for child in children {
			if let Some(slot) = self.slot_mut(child) {
				slot.parent = None;
			}
		}
		self.journal.push(Mutation::Clear { container });
		Ok(())
	}

	fn text(&self, output: OutputId) -> Option<String> {
		self.text_of(output).map(ToOwned::to_owned)
	}

	fn parent(&self, output: OutputId) -> Option<OutputId> {
		self.slot(output)?.parent
	}

	fn next_sibling(&self, output: OutputId) -> Option<OutputId> {
		let siblings = &self.slot(self.parent(output)?)?.children;
		let index = siblings.iter().position(|c| *c == output)?;
		siblings.get(index + 1).copied()
	}

	fn is_connected(&self, output: OutputId) -> bool {
		self.slot(output).is_some() && self.is_ancestor_or_self(self.root(), output)
	}

	fn accepts_children(&self, output: OutputId) -> bool {
		matches!(self.slot(output), Some(Slot { kind: Kind::Root, .. }) | Some(Slot { kind: Kind::Element { .. }, .. }))
	}

	fn contains(&self, output: OutputId) -> bool {
		self.slot(output).is_some()
	}

	fn finish_cycle(&mut self) {
		let drained = self.listeners.drain_weak().len();
		if drained > 0 {
			trace!("Freed {} listener binding(s).", drained)
		}

		let stale: HashSet<OutputId> = self.slots.keys().copied().filter(|output| !self.is_retained(*output)).collect();
		if !stale.is_empty() {
			self.slots.retain(|output, _| !stale.contains(output));
			self.forget(&stale);
		}
	}
}

impl Inspect for ArenaHost {
	fn tag_name(&self, output: OutputId) -> Option<String> {
		self.tag(output).map(ToOwned::to_owned)
	}

	fn attributes(&self, output: OutputId) -> Vec<(String, String)> {
		match self.slot(output).map(|slot| &slot.kind) {
			Some(Kind::Element { attributes, .. }) => attributes.iter().map(|(name, value)| (name.clone(), value.clone())).collect(),
			_ => Vec::new(),
		}
	}

	fn child_outputs(&self, output: OutputId) -> Vec<OutputId> {
		self.children(output).to_vec()
	}
}
