//! Materializing and reconciling [`Node`] trees against a [`Host`].
//!
//! Children are compared by position only. Removing an item from the middle of a list
//! patches every later sibling against its shifted counterpart rather than recognizing a move.

use crate::{
	host::{Host, OutputId},
	node::{event_name, AttrValue, Attributes, Element, Node},
};
use tracing::{error, instrument, trace, trace_span, warn};

/// Used by the free functions' callers that don't configure anything else.
pub const DEFAULT_DEPTH_LIMIT: usize = 512;

/// Keeps player-provided text out of logs unless the `dangerous-logging` feature is enabled.
pub(crate) fn loggable(text: &str) -> &str {
	if cfg!(feature = "dangerous-logging") {
		text
	} else {
		"(redacted)"
	}
}

/// Materializes `node` and inserts it into `container`, before `before` or last.
///
/// Stores the new output on `node` (and its descendants). Host failures are logged and skip the failed part only.
#[instrument(skip(host, node), fields(tag = node.tag()))]
pub fn mount<H: Host + ?Sized>(host: &mut H, node: &mut Node, container: OutputId, before: Option<OutputId>, depth_limit: usize) {
	if depth_limit == 0 {
		return error!("Depth limit reached");
	}
	let output = match materialize(host, node, depth_limit) {
		Some(output) => output,
		None => return,
	};
	if let Err(error) = host.insert_before(container, output, before) {
		error!("Failed to insert <{}> into {}: {}", node.tag(), container, error)
	}
}

fn materialize<H: Host + ?Sized>(host: &mut H, node: &mut Node, depth_limit: usize) -> Option<OutputId> {
	let output = match node {
		Node::Text(text) => {
			let span = trace_span!("Creating text node", text = loggable(&text.text));
			let _enter = span.enter();
			match host.create_text(&text.text) {
				Ok(output) => output,
				Err(error) => {
					error!("Failed to create text node: {}", error);
					return None;
				}
			}
		}
		Node::Element(element) => {
			let span = trace_span!("Creating element", tag = element.tag());
			let _enter = span.enter();
			let output = match host.create_element(element.tag()) {
				Ok(output) => output,
				Err(error) => {
					error!("Failed to create <{}>: {}", element.tag(), error);
					return None;
				}
			};

			for (name, value) in element.attrs.iter() {
				bind(host, output, name, value)
			}

			// The parent is brand new, so children are simply appended.
			for child in &mut element.children {
				mount(host, child, output, None, depth_limit - 1)
			}
			output
		}
	};
	node.set_output(output);
	Some(output)
}

/// Detaches `node`'s output from its parent, if it is mounted and still attached.
///
/// The output handle stays on `node`.
#[instrument(skip(host, node), fields(tag = node.tag()))]
pub fn unmount<H: Host + ?Sized>(host: &mut H, node: &Node) {
	let output = match node.output() {
		Some(output) => output,
		None => return trace!("Never mounted."),
	};
	let parent = match host.parent(output) {
		Some(parent) => parent,
		None => return trace!("Already detached."),
	};
	if let Err(error) = host.remove_child(parent, output) {
		error!("Failed to detach {} from {}: {}", output, parent, error)
	}
}

/// Updates the output of `old` so that it reflects `new`, reusing outputs where the tags match.
///
/// - Without a `new` node, `old` is unmounted.
/// - Without an attached `old` output, nothing happens: there is no position to patch at.
///   [`Renderer`](`crate::Renderer`) falls back to a full mount in that case on the next render.
#[instrument(skip(host, old, new))]
pub fn patch<H: Host + ?Sized>(host: &mut H, old: Option<&Node>, new: Option<&mut Node>, depth_limit: usize) {
	let new = match new {
		Some(new) => new,
		None => {
			if let Some(old) = old {
				if old.output().and_then(|output| host.parent(output)).is_some() {
					unmount(host, old)
				}
			}
			return trace!("No new node. Unmounted the old one, if it was attached.");
		}
	};
	match old {
		Some(old) => patch_node(host, old, new, depth_limit),
		None => warn!("No old node to patch against. Skipping."),
	}
}

fn patch_node<H: Host + ?Sized>(host: &mut H, old: &Node, new: &mut Node, depth_limit: usize) {
	if depth_limit == 0 {
		return error!("Depth limit reached");
	}

	let output = match old.output() {
		Some(output) => output,
		None => return trace!("Old node was never mounted; cannot patch."),
	};
	let parent = match host.parent(output) {
		Some(parent) => parent,
		None => return trace!("Old output {} is detached; cannot patch.", output),
	};

	match (old, new) {
		(Node::Text(old_text), Node::Text(new_text)) => {
			let span = trace_span!("Diffing text node", old = loggable(&old_text.text), new = loggable(&new_text.text));
			let _enter = span.enter();
			new_text.output = Some(output);
			// Compared against the live payload, so out-of-band edits are corrected.
			if host.text(output).as_deref() != Some(new_text.text.as_str()) {
				if let Err(error) = host.set_text(output, &new_text.text) {
					error!("Failed to update text of {}: {}", output, error)
				}
			}
		}

		(Node::Element(old_element), Node::Element(new_element)) if old_element.tag() == new_element.tag() => {
			let span = trace_span!("Diffing element", tag = old_element.tag());
			let _enter = span.enter();
			new_element.output = Some(output);
			update_attributes(host, output, &old_element.attrs, &new_element.attrs);
			update_children(host, output, old_element, new_element, depth_limit);
		}

		// Mismatching tags: Destroy and rebuild in place.
		(old, new) => {
			let span = trace_span!("Replacing mismatching node", old = old.tag(), new = new.tag());
			let _enter = span.enter();
			if old.tag().eq_ignore_ascii_case(new.tag()) {
				warn!(
					"Recreating element due to different tag name casing: {:?} -> {:?}",
					old.tag(),
					new.tag()
				)
			}

			let next_sibling = host.next_sibling(output);
			unmount(host, old);
			mount(host, new, parent, next_sibling, depth_limit);
		}
	}
}

fn bind<H: Host + ?Sized>(host: &mut H, output: OutputId, name: &str, value: &AttrValue) {
	match (event_name(name), value) {
		(Some(event), AttrValue::Callback(callback)) => {
			if let Err(error) = host.add_listener(output, &event, callback) {
				error!("Failed to add {:?} listener: {}", event, error)
			}
		}
		(None, AttrValue::Callback(_)) => warn!("Callback bound to non-event attribute {:?}; ignoring.", name),
		(_, value) => {
			if let Some(literal) = value.literal() {
				if let Err(error) = host.set_attribute(output, name, &literal) {
					error!("Could not set attribute {:?}={:?}: {}", name, loggable(&literal), error)
				}
			}
		}
	}
}

fn unbind<H: Host + ?Sized>(host: &mut H, output: OutputId, name: &str, value: &AttrValue) {
	match (event_name(name), value) {
		(Some(event), AttrValue::Callback(callback)) => {
			if let Err(error) = host.remove_listener(output, &event, callback) {
				error!("Failed to remove {:?} listener: {}", event, error)
			}
		}
		_ => remove_attribute(host, output, name),
	}
}

fn remove_attribute<H: Host + ?Sized>(host: &mut H, output: OutputId, name: &str) {
	if let Err(error) = host.remove_attribute(output, name) {
		warn!("Could not remove attribute {:?}: {}", name, error)
	}
}

/// Applies the difference between `old` and `new` to `output`.
///
/// Removed keys are unbound first. Under an event key, a [`Callback`](`crate::Callback`) is (re)bound as a listener,
/// while a literal value is written as an ordinary attribute, the same way [`mount`] treats it.
fn update_attributes<H: Host + ?Sized>(host: &mut H, output: OutputId, old: &Attributes, new: &Attributes) {
	for (name, value) in old.iter() {
		if !new.contains(name) {
			unbind(host, output, name, value)
		}
	}

	for (name, value) in new.iter() {
		let previous = old.get(name);
		if previous == Some(value) {
			continue;
		}

		match event_name(name) {
			Some(event) => {
				let mut was_bound = false;
				if let Some(AttrValue::Callback(previous)) = previous {
					was_bound = true;
					if let Err(error) = host.remove_listener(output, &event, previous) {
						error!("Failed to remove {:?} listener: {}", event, error)
					}
				}
				match value {
					AttrValue::Callback(callback) => {
						if previous.and_then(AttrValue::literal).is_some() {
							remove_attribute(host, output, name)
						}
						if let Err(error) = host.add_listener(output, &event, callback) {
							error!("Failed to add {:?} listener: {}", event, error)
						}
					}
					// A literal under an event name is an ordinary attribute.
					value => match value.literal() {
						Some(literal) => set_attribute(host, output, name, &literal),
						None if !was_bound => remove_attribute(host, output, name),
						None => (),
					},
				}
			}
			None => match value.literal() {
				Some(literal) => set_attribute(host, output, name, &literal),
				None => {
					if value.as_callback().is_some() {
						warn!("Callback bound to non-event attribute {:?}; ignoring.", name)
					}
					remove_attribute(host, output, name)
				}
			},
		}
	}
}

fn set_attribute<H: Host + ?Sized>(host: &mut H, output: OutputId, name: &str, literal: &str) {
	if let Err(error) = host.set_attribute(output, name, literal) {
		error!("Could not set attribute {:?}={:?}: {}", name, loggable(literal), error)
	}
}

fn update_children<H: Host + ?Sized>(host: &mut H, parent: OutputId, old: &Element, new: &mut Element, depth_limit: usize) {
	let old_children = &old.children;
	let new_children = &mut new.children;
	let span = trace_span!("Diffing children", old = old_children.len(), new = new_children.len());
	let _enter = span.enter();

	let is_attached = |host: &H, node: &Node| node.output().map_or(false, |output| host.parent(output) == Some(parent));
	let common_length = old_children.len().min(new_children.len());

	for (i, new_child) in new_children.iter_mut().enumerate().take(common_length) {
		let old_child = &old_children[i];
		if is_attached(host, old_child) {
			patch_node(host, old_child, new_child, depth_limit - 1);
		} else {
			// Detached out-of-band, or never materialized: Insert before the next old sibling that is still in place.
			trace!("Old child {} is not attached here. Mounting its replacement.", i);
			let before = old_children[i + 1..]
				.iter()
				.find(|sibling| is_attached(host, sibling))
				.and_then(Node::output);
			mount(host, new_child, parent, before, depth_limit - 1);
		}
	}

	for surplus in &old_children[common_length..] {
		if is_attached(host, surplus) {
			unmount(host, surplus)
		}
	}

	for added in &mut new_children[common_length..] {
		mount(host, added, parent, None, depth_limit - 1)
	}
}
