//! Building [`Node`] trees from existing outputs.

use crate::{
	host::{Inspect, OutputId},
	node::{Attributes, Element, Node, Text},
};
use tracing::{trace_span, warn};

/// Reads the output tree at `output` back into a [`Node`] whose output handles point at the existing outputs.
///
/// Returns [`None`] if `output` is neither an element nor a text node. Such children are skipped with a warning.
/// Event listeners can't be read back, so the result has none.
pub fn load<H: Inspect + ?Sized>(host: &H, output: OutputId) -> Option<Node> {
	if let Some(text) = host.text(output) {
		let mut text = Text::new(text);
		text.output = Some(output);
		return Some(Node::Text(text));
	}

	let tag = host.tag_name(output)?;
	let span = trace_span!("Loading element", tag = tag.as_str(), %output);
	let _enter = span.enter();

	let attrs = host.attributes(output).into_iter().collect::<Attributes>();
	let mut element = Element::new(tag).with_attrs(attrs);
	element.output = Some(output);
	for child in host.child_outputs(output) {
		match load(host, child) {
			Some(child) => element.children.push(child),
			None => warn!("Skipping unrecognised child {} while loading.", child),
		}
	}
	Some(Node::Element(element))
}
