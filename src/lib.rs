#![doc(html_root_url = "https://docs.rs/arcade-dom/0.1.0")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A small positional VDOM differ.
//!
//! Describe the whole view as a [`Node`] tree each frame (usually with [`h`]), then hand it to a [`Renderer`].
//! The first render into a container mounts the tree. Later renders patch the previous tree's outputs in place,
//! comparing children by index only.
//!
//! Outputs live in a [`Host`]: [`DomHost`] drives a browser document through [`web_sys`],
//! while [`ArenaHost`] keeps an in-memory tree and records every mutation.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod arena;
mod build;
mod diff;
mod error;
mod host;
mod load;
mod node;
mod rc_hash_map;
mod render;
mod store;
mod web;

pub use arena::{ArenaHost, Mutation};
pub use build::{h, Child};
pub use diff::{mount, patch, unmount, DEFAULT_DEPTH_LIMIT};
pub use error::{Error, HostError};
pub use host::{Host, Inspect, ListenerKey, OutputId};
pub use load::load;
pub use node::{event_name, format_number, AttrValue, Attributes, Callback, CallbackId, Element, Node, Text, EVENT_PREFIX, TEXT_TAG};
pub use render::{Options, Renderer};
pub use store::{Store, Subscription};
pub use web::DomHost;
