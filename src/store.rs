//! A single-threaded state container that re-renders subscribers on change.

use std::{
	cell::{Cell, RefCell},
	rc::{Rc, Weak},
};
use tracing::trace;

type Listeners<S> = RefCell<Vec<(u64, Rc<dyn Fn(&S)>)>>;

/// Shared application state with change subscribers.
///
/// Clones share the same state. Subscribers are notified after every [`Store::update`] and [`Store::replace`],
/// with a snapshot of the new state, and may themselves update the store.
///
/// ```
/// use arcade_dom::Store;
/// use std::{cell::Cell, rc::Rc};
///
/// let store = Store::new(3_u8);
/// let seen = Rc::new(Cell::new(0));
/// let subscription = store.subscribe({
/// 	let seen = Rc::clone(&seen);
/// 	move |countdown: &u8| seen.set(*countdown)
/// });
///
/// store.update(|countdown| *countdown -= 1);
/// assert_eq!(seen.get(), 2);
///
/// drop(subscription);
/// store.update(|countdown| *countdown -= 1);
/// assert_eq!(seen.get(), 2);
/// ```
pub struct Store<S> {
	state: Rc<RefCell<S>>,
	listeners: Rc<Listeners<S>>,
	next_id: Rc<Cell<u64>>,
}

impl<S> Clone for Store<S> {
	fn clone(&self) -> Self {
		Self {
			state: Rc::clone(&self.state),
			listeners: Rc::clone(&self.listeners),
			next_id: Rc::clone(&self.next_id),
		}
	}
}

impl<S: Clone + 'static> Store<S> {
	pub fn new(initial: S) -> Self {
		Self {
			state: Rc::new(RefCell::new(initial)),
			listeners: Rc::default(),
			next_id: Rc::default(),
		}
	}

	/// A snapshot of the current state.
	#[must_use]
	pub fn get(&self) -> S {
		self.state.borrow().clone()
	}

	pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
		f(&self.state.borrow())
	}

	pub fn replace(&self, state: S) {
		*self.state.borrow_mut() = state;
		self.notify()
	}

	pub fn update(&self, f: impl FnOnce(&mut S)) {
		f(&mut self.state.borrow_mut());
		self.notify()
	}

	/// Calls `listener` after each change until the returned [`Subscription`] is dropped.
	#[must_use = "Dropping the subscription unsubscribes immediately."]
	pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		self.listeners.borrow_mut().push((id, Rc::new(listener)));

		let listeners: Weak<Listeners<S>> = Rc::downgrade(&self.listeners);
		Subscription {
			unsubscribe: Some(Box::new(move || {
				if let Some(listeners) = listeners.upgrade() {
					listeners.borrow_mut().retain(|(listener_id, _)| *listener_id != id)
				}
			})),
		}
	}

	#[must_use]
	pub fn subscriber_count(&self) -> usize {
		self.listeners.borrow().len()
	}

	fn notify(&self) {
		let snapshot = self.get();
		// Cloned so listeners can (un)subscribe and update while being notified.
		let listeners: Vec<_> = self.listeners.borrow().iter().map(|(_, listener)| Rc::clone(listener)).collect();
		trace!("Notifying {} subscriber(s).", listeners.len());
		for listener in listeners {
			listener(&snapshot)
		}
	}
}

/// Keeps a [`Store`] subscriber registered while alive.
pub struct Subscription {
	unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	/// Keeps the subscriber registered for as long as the store exists.
	pub fn forget(mut self) {
		self.unsubscribe = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(unsubscribe) = self.unsubscribe.take() {
			unsubscribe()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Clone, Debug, Default, PartialEq)]
	struct Lobby {
		players: Vec<&'static str>,
		countdown: Option<u8>,
	}

	#[test]
	fn subscribers_see_each_update() {
		let store = Store::new(Lobby::default());
		let seen = Rc::new(RefCell::new(Vec::new()));
		let subscription = store.subscribe({
			let seen = Rc::clone(&seen);
			move |lobby: &Lobby| seen.borrow_mut().push(lobby.players.len())
		});

		store.update(|lobby| lobby.players.push("Alice"));
		store.update(|lobby| lobby.players.push("Bob"));
		store.replace(Lobby::default());

		assert_eq!(*seen.borrow(), [1, 2, 0]);
		assert_eq!(store.subscriber_count(), 1);
		drop(subscription);
		assert_eq!(store.subscriber_count(), 0);
	}

	#[test]
	fn listeners_may_update_reentrantly() {
		let store = Store::new(Lobby::default());
		store
			.subscribe({
				let store = store.clone();
				move |lobby: &Lobby| {
					if lobby.players.len() == 4 && lobby.countdown.is_none() {
						store.update(|lobby| lobby.countdown = Some(10))
					}
				}
			})
			.forget();

		for player in ["a", "b", "c", "d"] {
			store.update(|lobby| lobby.players.push(player))
		}
		assert_eq!(store.get().countdown, Some(10));
	}

	#[test]
	fn subscription_outliving_store_is_harmless() {
		let store = Store::new(0);
		let subscription = store.subscribe(|_| ());
		drop(store);
		drop(subscription);
	}
}
