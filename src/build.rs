//! Building [`Node`]s from loosely typed children.

use crate::node::{format_number, AttrValue, Attributes, Element, Node, Text, TEXT_TAG};
use serde_json::Value;
use tracing::warn;

/// One child argument of [`h`], before normalization.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
	Node(Node),
	Text(String),
	/// `null`, `undefined` or a boolean. Becomes an empty text node so that sibling indices stay stable.
	Null,
	/// Flattened into the surrounding list.
	List(Vec<Child>),
	/// Anything else. Logged and replaced by an empty text node.
	Unexpected(String),
}

/// Builds an element.
///
/// Children are flattened and normalized: text and numbers become text nodes,
/// while [`Child::Null`] and [`Child::Unexpected`] become empty text nodes.
/// With the [`TEXT_TAG`], the result is a text node holding the concatenated text of `children`.
pub fn h<C: Into<Child>>(tag: &str, attrs: Attributes, children: impl IntoIterator<Item = C>) -> Node {
	let mut normalized = Vec::new();
	for child in children {
		normalize(child.into(), &mut normalized);
	}

	if tag == TEXT_TAG {
		if !attrs.is_empty() {
			warn!("Attributes on a text node are ignored.");
		}
		return Node::Text(Text::new(normalized.iter().filter_map(Node::as_text).collect::<String>()));
	}

	let mut element = Element::new(tag).with_attrs(attrs);
	element.children = normalized;
	Node::Element(element)
}

fn normalize(child: Child, into: &mut Vec<Node>) {
	match child {
		Child::Node(node) => into.push(node),
		Child::Text(text) => into.push(Node::text(text)),
		Child::Null => into.push(Node::empty_text()),
		Child::List(children) => {
			for child in children {
				normalize(child, into)
			}
		}
		Child::Unexpected(description) => {
			warn!("Unexpected child: {}", description);
			into.push(Node::empty_text())
		}
	}
}

impl From<Node> for Child {
	fn from(node: Node) -> Self {
		Self::Node(node)
	}
}

impl From<Element> for Child {
	fn from(element: Element) -> Self {
		Self::Node(Node::Element(element))
	}
}

impl From<&str> for Child {
	fn from(text: &str) -> Self {
		Self::Text(text.to_owned())
	}
}

impl From<String> for Child {
	fn from(text: String) -> Self {
		Self::Text(text)
	}
}

impl From<&String> for Child {
	fn from(text: &String) -> Self {
		Self::Text(text.clone())
	}
}

impl From<char> for Child {
	fn from(c: char) -> Self {
		Self::Text(c.to_string())
	}
}

impl From<bool> for Child {
	fn from(_: bool) -> Self {
		Self::Null
	}
}

impl From<()> for Child {
	fn from(_: ()) -> Self {
		Self::Null
	}
}

impl<T: Into<Child>> From<Option<T>> for Child {
	fn from(child: Option<T>) -> Self {
		child.map_or(Self::Null, Into::into)
	}
}

impl<T: Into<Child>> From<Vec<T>> for Child {
	fn from(children: Vec<T>) -> Self {
		Self::List(children.into_iter().map(Into::into).collect())
	}
}

impl<T: Into<Child>, const N: usize> From<[T; N]> for Child {
	fn from(children: [T; N]) -> Self {
		Self::List(IntoIterator::into_iter(children).map(Into::into).collect())
	}
}

macro_rules! integer_child {
	($($t:ty),*) => {$(
		impl From<$t> for Child {
			fn from(value: $t) -> Self {
				Self::Text(value.to_string())
			}
		}
	)*};
}
integer_child!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl From<f64> for Child {
	fn from(value: f64) -> Self {
		Self::Text(format_number(value))
	}
}

impl From<f32> for Child {
	fn from(value: f32) -> Self {
		Self::Text(format_number(value.into()))
	}
}

impl From<&Value> for Child {
	fn from(value: &Value) -> Self {
		match value {
			Value::Null | Value::Bool(_) => Self::Null,
			Value::String(text) => Self::Text(text.clone()),
			Value::Number(number) => Self::Text(json_number(number)),
			Value::Array(children) => Self::List(children.iter().map(Into::into).collect()),
			Value::Object(_) => match Node::from_json(value) {
				Some(node) => Self::Node(node),
				None => Self::Unexpected(format!("object without a string `tag` ({} keys)", value.as_object().map_or(0, |o| o.len()))),
			},
		}
	}
}

impl From<Value> for Child {
	fn from(value: Value) -> Self {
		Self::from(&value)
	}
}

fn json_number(number: &serde_json::Number) -> String {
	if let Some(integer) = number.as_i64() {
		integer.to_string()
	} else if let Some(integer) = number.as_u64() {
		integer.to_string()
	} else {
		format_number(number.as_f64().unwrap_or(f64::NAN))
	}
}

impl Node {
	/// Reads a node from a loosely typed payload shaped like `{"tag": .., "attrs": {..}, "children": [..]}`.
	///
	/// Returns [`None`] if `value` is not an object with a string `tag`.
	/// Text nodes (`"tag": "#text"`) carry their payload as a string `children`.
	/// Nested or array attribute values are skipped with a warning.
	#[must_use]
	pub fn from_json(value: &Value) -> Option<Self> {
		let object = value.as_object()?;
		let tag = object.get("tag")?.as_str()?;

		if tag == TEXT_TAG {
			let text = match object.get("children") {
				Some(Value::String(text)) => text.clone(),
				Some(Value::Number(number)) => json_number(number),
				_ => String::new(),
			};
			return Some(Self::text(text));
		}

		let mut attrs = Attributes::new();
		if let Some(Value::Object(entries)) = object.get("attrs") {
			for (name, value) in entries {
				let value = match value {
					Value::Null => AttrValue::Null,
					Value::Bool(value) => AttrValue::Bool(*value),
					Value::String(value) => AttrValue::Str(value.clone()),
					Value::Number(number) => match number.as_f64() {
						Some(number) => AttrValue::Number(number),
						None => AttrValue::Str(json_number(number)),
					},
					Value::Array(_) | Value::Object(_) => {
						warn!("Skipping structured value of attribute {:?}.", name);
						continue;
					}
				};
				attrs.insert(name.as_str(), value);
			}
		}

		let children = match object.get("children") {
			None | Some(Value::Null) => Vec::new(),
			Some(Value::Array(children)) => children.iter().map(Child::from).collect(),
			Some(other) => vec![Child::from(other)],
		};
		Some(h(tag, attrs, children))
	}
}

/// Builds [`Attributes`] from `name => value` pairs.
///
/// ```
/// use arcade_dom::{attrs, AttrValue};
///
/// let attrs = attrs! { "class" => "tile wall", "data-x" => 3 };
/// assert_eq!(attrs.get("data-x"), Some(&AttrValue::Number(3.)));
/// ```
#[macro_export]
macro_rules! attrs {
	() => { $crate::Attributes::new() };
	($($name:expr => $value:expr),+ $(,)?) => {{
		let mut attrs = $crate::Attributes::new();
		$(attrs.insert($name, $value);)+
		attrs
	}};
}

/// Builds a heterogeneous child list for [`h`].
///
/// ```
/// use arcade_dom::{attrs, children, h};
///
/// let countdown = h("div", attrs! {}, children!["Game starts in ", 3, None::<&str>, false]);
/// assert_eq!(countdown.as_element().unwrap().children().len(), 4);
/// ```
#[macro_export]
macro_rules! children {
	() => { ::std::vec::Vec::<$crate::Child>::new() };
	($($child:expr),+ $(,)?) => {
		::std::vec![$($crate::Child::from($child)),*]
	};
}
