//! The tree model: what a caller describes each frame, before (and after) it is materialized.

use crate::host::OutputId;
use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
};
use indexmap::IndexMap;
use std::rc::Rc;

/// Tag reported by [`Node::tag`] for text nodes.
///
/// No element can be created under this name. [`h`](`crate::h`) turns it into a text node instead.
pub const TEXT_TAG: &str = "#text";

/// Prefix of attribute names that bind event listeners when their value is a [`Callback`].
pub const EVENT_PREFIX: &str = "on";

/// One element or text node of a virtual tree.
///
/// Equality is structural: the materialized [`OutputId`]s are ignored.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
	Element(Element),
	Text(Text),
}

impl Node {
	pub fn text(text: impl Into<String>) -> Self {
		Self::Text(Text::new(text))
	}

	#[must_use]
	pub fn empty_text() -> Self {
		Self::Text(Text::new(String::new()))
	}

	/// The element tag, or [`TEXT_TAG`] for text nodes.
	#[must_use]
	pub fn tag(&self) -> &str {
		match self {
			Self::Element(element) => element.tag(),
			Self::Text(_) => TEXT_TAG,
		}
	}

	#[must_use]
	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text(_))
	}

	/// The output this node was last materialized as, if any.
	///
	/// This is a non-owning reference. The host decides whether it still exists.
	#[must_use]
	pub fn output(&self) -> Option<OutputId> {
		match self {
			Self::Element(element) => element.output,
			Self::Text(text) => text.output,
		}
	}

	pub(crate) fn set_output(&mut self, output: OutputId) {
		match self {
			Self::Element(element) => element.output = Some(output),
			Self::Text(text) => text.output = Some(output),
		}
	}

	#[must_use]
	pub fn as_element(&self) -> Option<&Element> {
		match self {
			Self::Element(element) => Some(element),
			Self::Text(_) => None,
		}
	}

	#[must_use]
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Element(_) => None,
			Self::Text(text) => Some(&text.text),
		}
	}
}

impl From<Element> for Node {
	fn from(element: Element) -> Self {
		Self::Element(element)
	}
}

impl From<Text> for Node {
	fn from(text: Text) -> Self {
		Self::Text(text)
	}
}

#[derive(Clone, Debug)]
pub struct Element {
	tag: String,
	pub(crate) attrs: Attributes,
	pub(crate) children: Vec<Node>,
	pub(crate) output: Option<OutputId>,
}

impl Element {
	/// Creates an element without attributes or children.
	///
	/// Prefer [`h`](`crate::h`) when building from loosely typed children.
	pub fn new(tag: impl Into<String>) -> Self {
		Self {
			tag: tag.into(),
			attrs: Attributes::new(),
			children: Vec::new(),
			output: None,
		}
	}

	#[must_use]
	pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attrs.insert(name, value);
		self
	}

	#[must_use]
	pub fn with_attrs(mut self, attrs: Attributes) -> Self {
		self.attrs = attrs;
		self
	}

	#[must_use]
	pub fn with_child(mut self, child: impl Into<Node>) -> Self {
		self.children.push(child.into());
		self
	}

	#[must_use]
	pub fn tag(&self) -> &str {
		&self.tag
	}

	#[must_use]
	pub fn attrs(&self) -> &Attributes {
		&self.attrs
	}

	#[must_use]
	pub fn children(&self) -> &[Node] {
		&self.children
	}

	#[must_use]
	pub fn output(&self) -> Option<OutputId> {
		self.output
	}
}

impl PartialEq for Element {
	fn eq(&self, other: &Self) -> bool {
		self.tag == other.tag && self.attrs == other.attrs && self.children == other.children
	}
}

#[derive(Clone, Debug)]
pub struct Text {
	pub(crate) text: String,
	pub(crate) output: Option<OutputId>,
}

impl Text {
	pub fn new(text: impl Into<String>) -> Self {
		Self { text: text.into(), output: None }
	}

	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.text
	}

	#[must_use]
	pub fn output(&self) -> Option<OutputId> {
		self.output
	}
}

impl PartialEq for Text {
	fn eq(&self, other: &Self) -> bool {
		self.text == other.text
	}
}

/// Attribute and event bindings of an [`Element`], in insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attributes(IndexMap<String, AttrValue>);

impl Attributes {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Inserts or replaces `name`. A replaced binding keeps its original position.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
		self.0.insert(name.into(), value.into())
	}

	pub fn remove(&mut self, name: &str) -> Option<AttrValue> {
		self.0.shift_remove(name)
	}

	#[must_use]
	pub fn get(&self, name: &str) -> Option<&AttrValue> {
		self.0.get(name)
	}

	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
		self.0.iter().map(|(name, value)| (name.as_str(), value))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// The event name bound by an attribute name, if it has the [`EVENT_PREFIX`].
///
/// `onClick` binds `click`.
#[must_use]
pub fn event_name(attribute: &str) -> Option<String> {
	match attribute.strip_prefix(EVENT_PREFIX) {
		Some(event) if !event.is_empty() => Some(event.to_lowercase()),
		_ => None,
	}
}

/// Value of one entry in [`Attributes`].
///
/// Equality is exact: strings and numbers by value, callbacks by identity.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
	/// Absent. Never written as an attribute.
	Null,
	Str(String),
	Number(f64),
	Bool(bool),
	Callback(Callback),
}

impl AttrValue {
	#[must_use]
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	/// The string written into the host for this value, or [`None`] for [`AttrValue::Null`] and callbacks.
	#[must_use]
	pub fn literal(&self) -> Option<String> {
		match self {
			Self::Null | Self::Callback(_) => None,
			Self::Str(value) => Some(value.clone()),
			Self::Number(value) => Some(format_number(*value)),
			Self::Bool(value) => Some(value.to_string()),
		}
	}

	#[must_use]
	pub fn as_callback(&self) -> Option<&Callback> {
		match self {
			Self::Callback(callback) => Some(callback),
			_ => None,
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_owned())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}

impl From<&String> for AttrValue {
	fn from(value: &String) -> Self {
		Self::Str(value.clone())
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}

impl From<Callback> for AttrValue {
	fn from(callback: Callback) -> Self {
		Self::Callback(callback)
	}
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(Self::Null, Into::into)
	}
}

macro_rules! number_attr_value {
	($($t:ty),*) => {$(
		impl From<$t> for AttrValue {
			#[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
			fn from(value: $t) -> Self {
				Self::Number(value as f64)
			}
		}
	)*};
}
number_attr_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

/// Formats a number the way JavaScript's `String(number)` does for the common cases.
#[must_use]
pub fn format_number(value: f64) -> String {
	if value.is_nan() {
		"NaN".to_owned()
	} else if value.is_infinite() {
		let infinity = if value > 0. { "Infinity" } else { "-Infinity" };
		infinity.to_owned()
	} else if value == 0. {
		"0".to_owned()
	} else if value.fract() == 0. && value.abs() < 1e21 {
		format!("{:.0}", value)
	} else {
		value.to_string()
	}
}

/// An event handler.
///
/// Two callbacks are the same handler only if they are clones of each other.
/// The payload is the host's event, e.g. a [`web_sys::Event`] in the browser.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&dyn Any)>);

/// Identity of a [`Callback`], stable across clones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(usize);

impl Callback {
	pub fn new(handler: impl Fn(&dyn Any) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	pub fn call(&self, event: &dyn Any) {
		(self.0)(event)
	}

	#[must_use]
	pub fn id(&self) -> CallbackId {
		CallbackId(Rc::as_ptr(&self.0).cast::<()>() as usize)
	}
}

impl PartialEq for Callback {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Debug for Callback {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "Callback({:#x})", self.id().0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn numbers_format_like_javascript() {
		assert_eq!(format_number(3.), "3");
		assert_eq!(format_number(-0.), "0");
		assert_eq!(format_number(2.5), "2.5");
		assert_eq!(format_number(1e20), "100000000000000000000");
		assert_eq!(format_number(f64::NAN), "NaN");
		assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
	}

	#[test]
	fn event_names_are_lowercased() {
		assert_eq!(event_name("onClick").as_deref(), Some("click"));
		assert_eq!(event_name("onkeydown").as_deref(), Some("keydown"));
		assert_eq!(event_name("on"), None);
		assert_eq!(event_name("class"), None);
	}

	#[test]
	fn callback_identity_survives_clones() {
		let a = Callback::new(|_| ());
		let b = Callback::new(|_| ());
		assert_eq!(a, a.clone());
		assert_ne!(a, b);
		assert_eq!(AttrValue::from(a.clone()), AttrValue::Callback(a));
	}

	#[test]
	fn structural_equality_ignores_outputs() {
		let mut mounted = Node::text("3");
		mounted.set_output(OutputId::new(7));
		assert_eq!(mounted, Node::text("3"));
	}
}
