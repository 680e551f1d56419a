#![allow(dead_code)]

use arcade_dom::{ArenaHost, Node, OutputId, Renderer};
use tracing_subscriber::EnvFilter;

pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

/// A renderer over a fresh [`ArenaHost`] and one container attached to its root, with an empty journal.
pub fn setup() -> (Renderer<ArenaHost>, OutputId) {
	init_logging();
	let mut renderer = Renderer::new(ArenaHost::new());
	let container = renderer.host_mut().create_container().unwrap();
	renderer.host_mut().take_mutations();
	(renderer, container)
}

/// Output of the child at `path` below the tree last rendered into `container`.
pub fn output_at(renderer: &Renderer<ArenaHost>, container: OutputId, path: &[usize]) -> OutputId {
	let mut node: &Node = renderer.previous(container).unwrap();
	for &i in path {
		node = &node.as_element().unwrap().children()[i];
	}
	node.output().unwrap()
}
