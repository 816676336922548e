//! Weak observer registry.
//!
//! Producers hold their listeners weakly so that a disposed consumer is never
//! kept alive by the sources it listens to. Consumers still unsubscribe
//! explicitly on teardown; dead entries are additionally pruned on notify.

use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A set of weakly held listeners.
pub struct ListenerSet<L: ?Sized> {
	listeners: Mutex<Vec<(SubscriptionId, Weak<L>)>>,
	next_id: AtomicU64,
}

impl<L: ?Sized> Default for ListenerSet<L> {
	fn default() -> Self {
		Self {
			listeners: Mutex::new(Vec::new()),
			next_id: AtomicU64::new(1),
		}
	}
}

impl<L: ?Sized> ListenerSet<L> {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a listener.
	pub fn subscribe(&self, listener: Weak<L>) -> SubscriptionId {
		let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		self.listeners.lock().push((id, listener));
		id
	}

	/// Removes a listener. Unknown ids are ignored.
	pub fn unsubscribe(&self, id: SubscriptionId) {
		self.listeners.lock().retain(|(sub, _)| *sub != id);
	}

	/// Number of registered entries, live or not yet pruned.
	pub fn len(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Returns true if nothing is registered.
	pub fn is_empty(&self) -> bool {
		self.listeners.lock().is_empty()
	}

	/// Calls `f` for every live listener, pruning dead ones.
	///
	/// Listeners are invoked outside the registry lock, so a callback may
	/// subscribe or unsubscribe without deadlocking.
	pub fn notify(&self, mut f: impl FnMut(&L)) {
		let live: Vec<_> = {
			let mut listeners = self.listeners.lock();
			listeners.retain(|(_, weak)| weak.strong_count() > 0);
			listeners.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
		};
		for listener in &live {
			f(listener);
		}
	}
}
