//! The browser DOM as a [`Host`].

use crate::{
	error::HostError,
	host::{Host, Inspect, ListenerKey, OutputId},
	node::Callback,
	rc_hash_map::{CountSaturatedError, RcHashMap},
};
use core::cell::{Cell, RefCell};
use hashbrown::{HashMap, HashSet};
use js_sys::{Function, Reflect};
use tracing::{error, info, trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};

/// Expando property holding a node's [`OutputId`], so that parent and sibling queries can map back to ids.
const OUTPUT_ID_PROPERTY: &str = "__arcadeDomOutputId";

/// A [`Host`] that mutates a live [`web_sys::Document`].
///
/// Render containers must be registered with [`DomHost::adopt`]. Other nodes met during queries are registered on demand.
///
/// # Event listeners
///
/// Each (output, event, callback) binding gets one [`Closure`].
/// Closures are only freed in [`Host::finish_cycle`], so a handler may trigger a render that unbinds it.
///
/// Outputs that are neither connected to the document nor inside an adopted container are forgotten at the end of each render,
/// and their remaining listeners are removed. A container that is rendered into before it is inserted into the document keeps its content.
#[derive(Debug)]
pub struct DomHost {
	document: web_sys::Document,
	outputs: RefCell<HashMap<OutputId, web_sys::Node>>,
	pinned: HashSet<OutputId>,
	next_id: Cell<u64>,
	listeners: RcHashMap<ListenerKey, u16, Closure<dyn Fn(web_sys::Event)>>,
}

fn js_error(error: JsValue) -> HostError {
	HostError::Js(format!("{:?}", error))
}

impl DomHost {
	#[must_use]
	pub fn new(document: web_sys::Document) -> Self {
		Self {
			document,
			outputs: RefCell::default(),
			pinned: HashSet::new(),
			next_id: Cell::new(0),
			listeners: RcHashMap::new(),
		}
	}

	/// The host for the current window's document, if there is one.
	#[must_use]
	pub fn for_window() -> Option<Self> {
		Some(Self::new(web_sys::window()?.document()?))
	}

	#[must_use]
	pub fn document(&self) -> &web_sys::Document {
		&self.document
	}

	/// Registers `node` as a render container and keeps it (and its content) known until [`DomHost::release`].
	pub fn adopt(&mut self, node: &web_sys::Node) -> OutputId {
		let output = self.register(node);
		self.pinned.insert(output);
		output
	}

	/// Adopts the element with the given `id` attribute, if it exists.
	pub fn adopt_by_id(&mut self, id: &str) -> Option<OutputId> {
		let element = self.document.get_element_by_id(id)?;
		Some(self.adopt(element.as_ref()))
	}

	/// Lets go of a container registered with [`DomHost::adopt`].
	///
	/// Unless it is still connected, it's forgotten right away, and a [`Renderer`](`crate::Renderer`) drops the tree remembered for it.
	pub fn release(&mut self, container: OutputId) {
		self.pinned.remove(&container);
		let outputs = self.outputs.get_mut();
		if outputs.get(&container).map_or(false, |node| !node.is_connected()) {
			outputs.remove(&container);
		}
	}

	/// The DOM node behind `output`.
	#[must_use]
	pub fn node(&self, output: OutputId) -> Option<web_sys::Node> {
		self.outputs.borrow().get(&output).cloned()
	}

	fn register(&self, node: &web_sys::Node) -> OutputId {
		if let Some(output) = self.lookup(node) {
			return output;
		}

		let output = OutputId::new(self.next_id.get());
		self.next_id.set(output.get() + 1);
		#[allow(clippy::cast_precision_loss)]
		let raw = output.get() as f64;
		if let Err(error) = Reflect::set(node, &JsValue::from_str(OUTPUT_ID_PROPERTY), &JsValue::from_f64(raw)) {
			warn!("Could not tag node with {}: {:?}", output, error)
		}
		self.outputs.borrow_mut().insert(output, node.clone());
		output
	}

	fn lookup(&self, node: &web_sys::Node) -> Option<OutputId> {
		let raw = Reflect::get(node, &JsValue::from_str(OUTPUT_ID_PROPERTY)).ok()?.as_f64()?;
		#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
		let output = OutputId::new(raw as u64);
		match self.outputs.borrow().get(&output) {
			// Another host may have tagged the node with its own id.
			Some(known) if known.is_same_node(Some(node)) => Some(output),
			_ => None,
		}
	}

	fn existing(&self, output: OutputId) -> Result<web_sys::Node, HostError> {
		self.node(output).ok_or(HostError::UnknownOutput(output))
	}

	fn element(&self, output: OutputId) -> Result<web_sys::Element, HostError> {
		self.existing(output)?
			.dyn_into::<web_sys::Element>()
			.map_err(|_| HostError::WrongKind { output, expected: "an element" })
	}

	/// Whether `node` is connected or inside an adopted container.
	fn is_retained(&self, node: &web_sys::Node) -> bool {
		if node.is_connected() {
			return true;
		}
		let mut current = Some(node.clone());
		while let Some(node) = current {
			if self.lookup(&node).map_or(false, |output| self.pinned.contains(&output)) {
				return true;
			}
			current = node.parent_node();
		}
		false
	}
}

impl Host for DomHost {
	fn create_element(&mut self, tag: &str) -> Result<OutputId, HostError> {
		let element = self.document.create_element(tag).map_err(js_error)?;
		Ok(self.register(element.as_ref()))
	}

	fn create_text(&mut self, text: &str) -> Result<OutputId, HostError> {
		let text = self.document.create_text_node(text);
		Ok(self.register(text.as_ref()))
	}

	fn set_text(&mut self, output: OutputId, text: &str) -> Result<(), HostError> {
		let node = self.existing(output)?;
		if node.node_type() != web_sys::Node::TEXT_NODE {
			return Err(HostError::WrongKind { output, expected: "a text node" });
		}
		node.set_node_value(Some(text));
		Ok(())
	}

	fn set_attribute(&mut self, output: OutputId, name: &str, value: &str) -> Result<(), HostError> {
		self.element(output)?.set_attribute(name, value).map_err(js_error)
	}

	fn remove_attribute(&mut self, output: OutputId, name: &str) -> Result<(), HostError> {
		self.element(output)?.remove_attribute(name).map_err(js_error)
	}

	fn add_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError> {
		let target = self.element(output)?;
		let handler = callback.clone();
		let closure = self
			.listeners
			.increment_or_insert_with(ListenerKey::new(output, event, callback), move || {
				Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&event)) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|CountSaturatedError| HostError::TooManyBindings)?;
		target
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
			.map_err(js_error)
	}

	fn remove_listener(&mut self, output: OutputId, event: &str, callback: &Callback) -> Result<(), HostError> {
		let target = self.existing(output)?;
		match self.listeners.weak_decrement(&ListenerKey::new(output, event, callback)) {
			Ok(Some((0, closure))) => target
				.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref::<Function>())
				.map_err(js_error),
			// The DOM deduplicates identical listeners, so it's still bound once.
			Ok(Some(_)) => Ok(()),
			Ok(None) | Err(CountSaturatedError) => Err(HostError::UnknownListener {
				output,
				event: event.to_owned(),
			}),
		}
	}

	fn insert_before(&mut self, parent: OutputId, child: OutputId, before: Option<OutputId>) -> Result<(), HostError> {
		let parent = self.existing(parent)?;
		let child = self.existing(child)?;
		let before = match before {
			Some(before) => Some(self.existing(before)?),
			None => None,
		};
		parent.insert_before(&child, before.as_ref()).map(drop).map_err(js_error)
	}

	fn remove_child(&mut self, parent: OutputId, child: OutputId) -> Result<(), HostError> {
		let parent = self.existing(parent)?;
		let child = self.existing(child)?;
		parent.remove_child(&child).map(drop).map_err(js_error)
	}

	fn clear_children(&mut self, container: OutputId) -> Result<(), HostError> {
		self.existing(container)?.set_text_content(None);
		Ok(())
	}

	fn text(&self, output: OutputId) -> Option<String> {
		let node = self.node(output)?;
		if node.node_type() == web_sys::Node::TEXT_NODE {
			node.node_value()
		} else {
			None
		}
	}

	fn parent(&self, output: OutputId) -> Option<OutputId> {
		let parent = self.node(output)?.parent_node()?;
		Some(self.register(&parent))
	}

	fn next_sibling(&self, output: OutputId) -> Option<OutputId> {
		let sibling = self.node(output)?.next_sibling()?;
		Some(self.register(&sibling))
	}

	fn is_connected(&self, output: OutputId) -> bool {
		self.node(output).map_or(false, |node| node.is_connected())
	}

	fn accepts_children(&self, output: OutputId) -> bool {
		self.node(output).map_or(false, |node| {
			matches!(
				node.node_type(),
				web_sys::Node::ELEMENT_NODE | web_sys::Node::DOCUMENT_NODE | web_sys::Node::DOCUMENT_FRAGMENT_NODE
			)
		})
	}

	fn contains(&self, output: OutputId) -> bool {
		self.outputs.borrow().contains_key(&output)
	}

	fn finish_cycle(&mut self) {
		let freed = self.listeners.drain_weak().len();
		if freed > 0 {
			trace!("Freed {} event listener closure(s).", freed);
		}

		let stale: HashSet<OutputId> = self
			.outputs
			.borrow()
			.iter()
			.filter(|(output, node)| !self.pinned.contains(*output) && !self.is_retained(node))
			.map(|(output, _)| *output)
			.collect();
		if stale.is_empty() {
			return;
		}

		for (key, closure) in self.listeners.remove_where(|key, _| stale.contains(&key.output)) {
			if let Some(node) = self.node(key.output) {
				if let Err(error) = node.remove_event_listener_with_callback(&key.event, closure.as_ref().unchecked_ref::<Function>()) {
					error!("Failed to remove {:?} listener from forgotten {}: {:?}", key.event, key.output, error)
				}
			}
		}
		self.outputs.get_mut().retain(|output, _| !stale.contains(output));
		info!("Forgot {} detached output(s). Outputs/listeners: {}/{}", stale.len(), self.outputs.get_mut().len(), self.listeners.len());
	}
}

impl Inspect for DomHost {
	fn tag_name(&self, output: OutputId) -> Option<String> {
		self.node(output)?.dyn_ref::<web_sys::Element>().map(web_sys::Element::local_name)
	}

	fn attributes(&self, output: OutputId) -> Vec<(String, String)> {
		let element = match self.node(output).and_then(|node| node.dyn_into::<web_sys::Element>().ok()) {
			Some(element) => element,
			None => return Vec::new(),
		};
		let attributes = element.attributes();
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.local_name(), attribute.value()))
			.collect()
	}

	fn child_outputs(&self, output: OutputId) -> Vec<OutputId> {
		let child_nodes = match self.node(output) {
			Some(node) => node.child_nodes(),
			None => return Vec::new(),
		};
		(0..child_nodes.length())
			.filter_map(|i| child_nodes.item(i))
			.map(|child| self.register(&child))
			.collect()
	}
}
