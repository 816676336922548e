//! Pluggable mark and status producers.
//!
//! A [`MarkSource`] publishes a changing set of marks and tells its listeners
//! what changed. A [`StatusProvider`] reports whether a producer's results are
//! current. [`MarkSet`] and [`StatusCell`] are ready-made mutable
//! implementations for producers that compute their results elsewhere.

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use xeno_marks::{Mark, UpToDate};

use crate::observer::{ListenerSet, SubscriptionId};

/// Payload of a mark-source change notification.
///
/// When both sets are present the receiver may patch its caches with their
/// difference. A missing set means the producer could not describe the change
/// and the receiver must rebuild from scratch.
#[derive(Debug, Clone, Default)]
pub struct MarkChange {
	/// Marks published before the change.
	pub old: Option<Vec<Arc<Mark>>>,
	/// Marks published after the change.
	pub new: Option<Vec<Arc<Mark>>>,
}

impl MarkChange {
	/// A change described by both snapshots.
	pub fn delta(old: Vec<Arc<Mark>>, new: Vec<Arc<Mark>>) -> Self {
		Self {
			old: Some(old),
			new: Some(new),
		}
	}

	/// A change without payload.
	pub fn opaque() -> Self {
		Self::default()
	}
}

/// Receives mark-source change notifications. Called on arbitrary threads.
pub trait MarkListener: Send + Sync {
	/// The source's marks changed.
	fn marks_changed(&self, change: MarkChange);
}

/// Receives status-provider change notifications. Called on arbitrary threads.
pub trait StatusListener: Send + Sync {
	/// The provider's status changed.
	fn status_changed(&self);
}

/// Supplier of marks for one document.
pub trait MarkSource: Send + Sync {
	/// Current marks.
	fn marks(&self) -> Vec<Arc<Mark>>;
	/// Registers a weakly held listener.
	fn subscribe(&self, listener: Weak<dyn MarkListener>) -> SubscriptionId;
	/// Removes a listener.
	fn unsubscribe(&self, id: SubscriptionId);
}

/// Supplier of a document's freshness state.
pub trait StatusProvider: Send + Sync {
	/// Current state.
	fn status(&self) -> UpToDate;
	/// Registers a weakly held listener.
	fn subscribe(&self, listener: Weak<dyn StatusListener>) -> SubscriptionId;
	/// Removes a listener.
	fn unsubscribe(&self, id: SubscriptionId);
}

/// A mutable [`MarkSource`].
#[derive(Default)]
pub struct MarkSet {
	marks: Mutex<Vec<Arc<Mark>>>,
	listeners: ListenerSet<dyn MarkListener>,
}

impl MarkSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a set with initial marks, without notifying anyone.
	pub fn with_marks(marks: impl IntoIterator<Item = Mark>) -> Self {
		Self {
			marks: Mutex::new(marks.into_iter().map(Arc::new).collect()),
			listeners: ListenerSet::new(),
		}
	}

	/// Replaces all marks and notifies listeners with both snapshots.
	pub fn replace(&self, marks: impl IntoIterator<Item = Arc<Mark>>) {
		let new: Vec<_> = marks.into_iter().collect();
		let old = std::mem::replace(&mut *self.marks.lock(), new.clone());
		let change = MarkChange::delta(old, new);
		self.listeners.notify(|l| l.marks_changed(change.clone()));
	}

	/// Replaces all marks and notifies listeners without describing the change.
	pub fn replace_opaque(&self, marks: impl IntoIterator<Item = Arc<Mark>>) {
		*self.marks.lock() = marks.into_iter().collect();
		self.listeners.notify(|l| l.marks_changed(MarkChange::opaque()));
	}

	/// Adds one mark, notifying with both snapshots.
	pub fn push(&self, mark: Mark) -> Arc<Mark> {
		let mark = Arc::new(mark);
		let mut next = self.marks();
		next.push(Arc::clone(&mark));
		self.replace(next);
		mark
	}

	/// Number of live listeners registered.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl MarkSource for MarkSet {
	fn marks(&self) -> Vec<Arc<Mark>> {
		self.marks.lock().clone()
	}

	fn subscribe(&self, listener: Weak<dyn MarkListener>) -> SubscriptionId {
		self.listeners.subscribe(listener)
	}

	fn unsubscribe(&self, id: SubscriptionId) {
		self.listeners.unsubscribe(id);
	}
}

/// A mutable [`StatusProvider`].
pub struct StatusCell {
	status: RwLock<UpToDate>,
	listeners: ListenerSet<dyn StatusListener>,
}

impl StatusCell {
	/// Creates a provider reporting `status`.
	pub fn new(status: UpToDate) -> Self {
		Self {
			status: RwLock::new(status),
			listeners: ListenerSet::new(),
		}
	}

	/// Updates the state, notifying listeners if it changed.
	pub fn set(&self, status: UpToDate) {
		let changed = {
			let mut current = self.status.write();
			std::mem::replace(&mut *current, status) != status
		};
		if changed {
			self.listeners.notify(|l| l.status_changed());
		}
	}

	/// Number of live listeners registered.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}
}

impl StatusProvider for StatusCell {
	fn status(&self) -> UpToDate {
		*self.status.read()
	}

	fn subscribe(&self, listener: Weak<dyn StatusListener>) -> SubscriptionId {
		self.listeners.subscribe(listener)
	}

	fn unsubscribe(&self, id: SubscriptionId) {
		self.listeners.unsubscribe(id);
	}
}
