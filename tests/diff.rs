use arcade_dom::{attrs, children, h, mount, patch, unmount, ArenaHost, Callback, Mutation, Node, OutputId, DEFAULT_DEPTH_LIMIT};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::any::Any;

mod arena_setup_;
use arena_setup_::init_logging;

fn host_with_container() -> (ArenaHost, OutputId) {
	init_logging();
	let mut host = ArenaHost::new();
	let container = host.create_container().unwrap();
	host.take_mutations();
	(host, container)
}

fn outputs(node: &Node, into: &mut Vec<Option<OutputId>>) {
	into.push(node.output());
	if let Some(element) = node.as_element() {
		for child in element.children() {
			outputs(child, into)
		}
	}
}

#[test]
fn mount_records_outputs_on_every_node() {
	let (mut host, container) = host_with_container();
	let mut node = h("div", attrs! {}, children![h("p", attrs! {}, children!["a", "b"]), "c"]);
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);

	let mut all = Vec::new();
	outputs(&node, &mut all);
	assert_eq!(all.len(), 5);
	assert!(all.iter().all(Option::is_some));
	assert_eq!(host.children(container), [node.output().unwrap()]);
}

#[test]
fn mount_before_sibling() {
	let (mut host, container) = host_with_container();
	let mut last = Node::text("last");
	mount(&mut host, &mut last, container, None, DEFAULT_DEPTH_LIMIT);
	let mut first = Node::text("first");
	mount(&mut host, &mut first, container, last.output(), DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.to_html(container), "<div>firstlast</div>");
}

#[test]
fn unmount_is_idempotent() {
	let (mut host, container) = host_with_container();
	let never_mounted = Node::text("ghost");
	unmount(&mut host, &never_mounted);
	assert_eq!(host.mutations(), []);

	let mut node = h("p", attrs! {}, children!["bye"]);
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);
	host.take_mutations();

	unmount(&mut host, &node);
	unmount(&mut host, &node);
	assert_eq!(
		host.mutations(),
		[Mutation::Remove {
			parent: container,
			child: node.output().unwrap(),
		}]
	);
	assert!(node.output().is_some());
	assert_eq!(host.to_html(container), "<div></div>");
}

#[test]
fn patch_without_a_new_node_unmounts() {
	let (mut host, container) = host_with_container();
	let mut old = h("p", attrs! {}, children![]);
	mount(&mut host, &mut old, container, None, DEFAULT_DEPTH_LIMIT);

	patch(&mut host, Some(&old), None, DEFAULT_DEPTH_LIMIT);
	assert!(host.children(container).is_empty());

	host.take_mutations();
	patch(&mut host, Some(&old), None, DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.mutations(), []);
}

#[test]
fn patch_without_an_old_node_does_nothing() {
	let (mut host, _) = host_with_container();
	let mut new = h("p", attrs! {}, children![]);
	patch(&mut host, None, Some(&mut new), DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.mutations(), []);
	assert_eq!(new.output(), None);
}

#[test]
fn patch_against_unmounted_old_node_does_nothing() {
	let (mut host, _) = host_with_container();
	let old = h("p", attrs! {}, children!["x"]);
	let mut new = h("p", attrs! {}, children!["y"]);
	patch(&mut host, Some(&old), Some(&mut new), DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.mutations(), []);
}

#[test]
fn tag_casing_counts_as_a_different_tag() {
	let (mut host, container) = host_with_container();
	let mut old = h("div", attrs! {}, children![]);
	mount(&mut host, &mut old, container, None, DEFAULT_DEPTH_LIMIT);
	host.take_mutations();

	let mut new = h("DIV", attrs! {}, children![]);
	patch(&mut host, Some(&old), Some(&mut new), DEFAULT_DEPTH_LIMIT);
	assert_ne!(new.output(), old.output());
	assert_eq!(host.tag(new.output().unwrap()), Some("DIV"));
	assert_eq!(host.children(container), [new.output().unwrap()]);
}

#[test]
fn literals_under_event_names_are_attributes() {
	let (mut host, container) = host_with_container();
	let mut node = h("a", attrs! { "onclick" => "return false" }, children![]);
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);
	let output = node.output().unwrap();
	assert_eq!(host.attribute(output, "onclick"), Some("return false"));
	assert_eq!(host.listener_count(output, "click"), 0);

	let mut rebound = h("a", attrs! { "onclick" => Callback::new(|_: &dyn Any| ()) }, children![]);
	patch(&mut host, Some(&node), Some(&mut rebound), DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.attribute(output, "onclick"), None);
	assert_eq!(host.listener_count(output, "click"), 1);
}

#[test]
fn callbacks_on_plain_attributes_are_ignored() {
	let (mut host, container) = host_with_container();
	let mut node = h("div", attrs! { "title" => Callback::new(|_: &dyn Any| ()) }, children![]);
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);
	let output = node.output().unwrap();
	assert_eq!(host.attribute(output, "title"), None);
	assert!(!host
		.mutations()
		.iter()
		.any(|mutation| matches!(mutation, Mutation::SetAttribute { .. } | Mutation::AddListener { .. })));
}

#[test]
fn scalar_attributes_are_stringified() {
	let (mut host, container) = host_with_container();
	let mut node = h("div", attrs! { "data-lives" => 3, "data-speed" => 1.5, "hidden" => true }, children![]);
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);
	assert_eq!(host.to_html(container), r#"<div><div data-lives="3" data-speed="1.5" hidden="true"></div></div>"#);
}

#[test]
fn json_trees_mount() {
	let (mut host, container) = host_with_container();
	let payload = json!({
		"tag": "div",
		"attrs": { "class": "player-card", "data-lives": 3 },
		"children": [
			{ "tag": "span", "children": ["Alice"] },
			{ "tag": "#text", "children": " - " },
			null,
			42
		]
	});
	let mut node = Node::from_json(&payload).unwrap();
	mount(&mut host, &mut node, container, None, DEFAULT_DEPTH_LIMIT);
	assert_eq!(
		host.to_html(container),
		r#"<div><div class="player-card" data-lives="3"><span>Alice</span> - 42</div></div>"#
	);
}
