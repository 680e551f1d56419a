use crate::{
	diff::{self, DEFAULT_DEPTH_LIMIT},
	error::Error,
	host::{Host, Inspect, OutputId},
	load::load,
	node::Node,
};
use hashbrown::HashMap;
use tracing::{debug, error, instrument, trace, warn};

/// Configuration of a [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Options {
	/// How deep mount and patch recurse before giving up on a subtree.
	pub depth_limit: usize,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			depth_limit: DEFAULT_DEPTH_LIMIT,
		}
	}
}

impl Options {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn depth_limit(mut self, depth_limit: usize) -> Self {
		self.depth_limit = depth_limit;
		self
	}
}

/// Renders node trees into containers of a [`Host`], remembering the last tree rendered into each.
///
/// The first render into a container mounts from scratch. Later renders patch against the remembered tree,
/// unless its output was detached from the host root in the meantime, in which case the container is cleared and mounted again.
///
/// # Correct Use
///
/// Renders into the same container must not overlap, i.e. don't call [`Renderer::render`] for a container
/// from an event handler the same container's previous render is still dispatching synchronously.
///
/// Memory is weak with respect to containers: once the host forgets a container,
/// the tree remembered for it is dropped on the next render.
#[derive(Debug)]
pub struct Renderer<H: Host> {
	host: H,
	previous: HashMap<OutputId, Node>,
	options: Options,
}

impl<H: Host> Renderer<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self::with_options(host, Options::default())
	}

	#[must_use]
	pub fn with_options(host: H, options: Options) -> Self {
		Self {
			host,
			previous: HashMap::new(),
			options,
		}
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	#[must_use]
	pub fn into_host(self) -> H {
		self.host
	}

	#[must_use]
	pub fn options(&self) -> Options {
		self.options
	}

	/// Renders `node` into `container`.
	///
	/// `None` stands for an invalid tree: the remembered tree's output is removed (if it could be patched)
	/// and the container is forgotten, so that the next valid render mounts from scratch.
	///
	/// # Errors
	///
	/// Iff `container` can't accept children. Nothing is mutated in that case.
	#[instrument(skip(self, node))]
	pub fn render(&mut self, node: Option<Node>, container: OutputId) -> Result<(), Error> {
		self.forget_released();

		if !self.host.accepts_children(container) {
			error!("Invalid container {} provided.", container);
			return Err(Error::InvalidContainer(container));
		}

		let mut node = node;
		let host = &self.host;
		let previous = self
			.previous
			.remove(&container)
			.filter(|previous| previous.output().map_or(false, |output| host.is_connected(output)));

		match previous {
			None => {
				debug!("Full mount into {}.", container);
				if let Err(error) = self.host.clear_children(container) {
					error!("Failed to clear {}: {}", container, error)
				}
				match node.as_mut() {
					Some(node) => diff::mount(&mut self.host, node, container, None, self.options.depth_limit),
					None => warn!("Nothing to mount into {}.", container),
				}
			}
			Some(previous) => {
				trace!("Patching {}.", container);
				diff::patch(&mut self.host, Some(&previous), node.as_mut(), self.options.depth_limit)
			}
		}

		match node {
			Some(node) => {
				self.previous.insert(container, node);
			}
			None => debug!("Forgot {}: The new tree is invalid.", container),
		}

		self.host.finish_cycle();
		Ok(())
	}

	/// The tree last rendered into `container`, if any.
	#[must_use]
	pub fn previous(&self, container: OutputId) -> Option<&Node> {
		self.previous.get(&container)
	}

	/// Stops tracking `container`, so the next render into it mounts from scratch.
	pub fn forget(&mut self, container: OutputId) -> Option<Node> {
		self.previous.remove(&container)
	}

	fn forget_released(&mut self) {
		let host = &self.host;
		let before = self.previous.len();
		self.previous.retain(|container, _| host.contains(*container));
		let released = before - self.previous.len();
		if released > 0 {
			debug!("Forgot {} released container(s).", released)
		}
	}
}

impl<H: Inspect> Renderer<H> {
	/// Adopts the existing content of `container` as its previous tree, so that the next render patches it instead of starting over.
	///
	/// Only works if `container` holds exactly one element or text node. Returns whether that was the case.
	#[instrument(skip(self))]
	pub fn hydrate(&mut self, container: OutputId) -> bool {
		let children = self.host.child_outputs(container);
		let output = match children.as_slice() {
			[output] => *output,
			_ => {
				warn!("Can't hydrate {}: Expected exactly one child but found {}.", container, children.len());
				return false;
			}
		};
		match load(&self.host, output) {
			Some(node) => {
				self.previous.insert(container, node);
				true
			}
			None => {
				warn!("Can't hydrate {}: Its child is neither an element nor text.", container);
				false
			}
		}
	}
}
