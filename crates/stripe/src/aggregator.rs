//! Merges every mark source of a document into one cached view.
//!
//! The aggregator owns the source list for one (document, viewer) pairing,
//! listens to each source through a weak back-reference and keeps the merged
//! mark set and line index in the shared caches. Change notifications that
//! carry both snapshots are applied in place; anything else drops the caches
//! to be rebuilt on the next query.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};
use xeno_marks::{Mark, UpToDate};

use crate::cache::{LineIndex, MergedMarks, SharedCaches, build_index, merge};
use crate::document::{AnnotationStore, StripeDocument};
use crate::observer::SubscriptionId;
use crate::registry::SourceRegistry;
use crate::repaint::{RepaintFlags, RepaintTrigger};
use crate::source::{MarkChange, MarkListener, MarkSource, StatusListener, StatusProvider};

/// Producers attached for the current document.
#[derive(Default)]
struct Attachment {
	document: Option<Arc<dyn StripeDocument>>,
	sources: Vec<(Arc<dyn MarkSource>, SubscriptionId)>,
	providers: Vec<(Arc<dyn StatusProvider>, SubscriptionId)>,
	annotations: Option<Arc<dyn AnnotationStore>>,
}

impl Attachment {
	fn detach(&mut self) {
		for (source, id) in self.sources.drain(..) {
			source.unsubscribe(id);
		}
		for (provider, id) in self.providers.drain(..) {
			provider.unsubscribe(id);
		}
		self.annotations = None;
		self.document = None;
	}
}

/// Per-view mark aggregator.
pub struct MarkAggregator {
	registry: Arc<SourceRegistry>,
	caches: SharedCaches,
	attachment: Mutex<Attachment>,
	repaint: Arc<dyn RepaintTrigger>,
	this: Weak<MarkAggregator>,
}

impl MarkAggregator {
	/// Creates an aggregator with no document attached.
	pub fn new(
		registry: Arc<SourceRegistry>,
		caches: SharedCaches,
		repaint: Arc<dyn RepaintTrigger>,
	) -> Arc<Self> {
		Arc::new_cyclic(|this| Self {
			registry,
			caches,
			attachment: Mutex::new(Attachment::default()),
			repaint,
			this: this.clone(),
		})
	}

	/// Attaches to `doc`: gathers its producers, subscribes to them and resets
	/// the caches.
	///
	/// Any previous attachment is detached first, so calling this again on
	/// document swap or content-type change is safe.
	pub fn register(&self, doc: Arc<dyn StripeDocument>) {
		let mut attachment = self.attachment.lock();
		attachment.detach();

		let mark_listener: Weak<dyn MarkListener> = self.this.clone();
		let status_listener: Weak<dyn StatusListener> = self.this.clone();

		attachment.sources = self
			.registry
			.create_mark_sources(&doc)
			.into_iter()
			.map(|source| {
				let id = source.subscribe(mark_listener.clone());
				(source, id)
			})
			.collect();
		attachment.providers = self
			.registry
			.create_status_providers(&doc)
			.into_iter()
			.map(|provider| {
				let id = provider.subscribe(status_listener.clone());
				(provider, id)
			})
			.collect();
		attachment.annotations = doc.annotations();

		debug!(
			content_type = doc.content_type(),
			sources = attachment.sources.len(),
			providers = attachment.providers.len(),
			legacy = attachment.annotations.is_some(),
			"Registered mark aggregator"
		);
		attachment.document = Some(doc);
		drop(attachment);

		self.invalidate();
		self.repaint.request(RepaintFlags::all());
	}

	/// Detaches from every producer. Safe to call repeatedly.
	pub fn unregister(&self) {
		let mut attachment = self.attachment.lock();
		if attachment.document.is_none() && attachment.sources.is_empty() {
			return;
		}
		attachment.detach();
		drop(attachment);
		debug!("Unregistered mark aggregator");
		self.invalidate();
	}

	/// The attached document.
	pub fn document(&self) -> Option<Arc<dyn StripeDocument>> {
		self.attachment.lock().document.clone()
	}

	/// The attached document's legacy annotation store.
	pub fn annotations(&self) -> Option<Arc<dyn AnnotationStore>> {
		self.attachment.lock().annotations.clone()
	}

	/// Current status of every attached provider.
	pub fn provider_statuses(&self) -> Vec<UpToDate> {
		let providers: Vec<_> = self
			.attachment
			.lock()
			.providers
			.iter()
			.map(|(provider, _)| Arc::clone(provider))
			.collect();
		providers.iter().map(|p| p.status()).collect()
	}

	/// Number of attached mark sources.
	pub fn source_count(&self) -> usize {
		self.attachment.lock().sources.len()
	}

	/// Drops the merged set and line index. The source list is kept.
	pub fn invalidate(&self) {
		self.caches.lock().marks.invalidate();
	}

	/// Every current mark, deduplicated by identity.
	///
	/// The returned vector is a copy; its order is unspecified.
	pub fn merged_marks(&self) -> Vec<Arc<Mark>> {
		self.with_merged(|merged| merged.values().cloned().collect())
	}

	/// A copy of the sorted line index.
	pub fn line_index(&self) -> LineIndex {
		self.with_line_index(LineIndex::clone)
	}

	/// Runs `f` against the merged set, building it first if needed.
	pub fn with_merged<R>(&self, f: impl FnOnce(&MergedMarks) -> R) -> R {
		let epoch = {
			let caches = self.caches.lock();
			if let Some(merged) = caches.marks.merged() {
				return f(merged);
			}
			caches.marks.epoch()
		};

		let gathered = merge(self.gather());
		let mut caches = self.caches.lock();
		match caches.marks.try_install(epoch, gathered) {
			Ok(merged) => f(merged),
			Err(stale) => f(&stale.into_marks()),
		}
	}

	/// Runs `f` against the line index, building it first if needed.
	///
	/// The cache lock is held while `f` runs; `f` must not call back into the
	/// aggregator.
	pub fn with_line_index<R>(&self, f: impl FnOnce(&LineIndex) -> R) -> R {
		let epoch = {
			let mut caches = self.caches.lock();
			if let Some(index) = caches.marks.index() {
				return f(index);
			}
			caches.marks.epoch()
		};

		let gathered = merge(self.gather());
		let mut caches = self.caches.lock();
		match caches.marks.try_install(epoch, gathered) {
			Ok(_) => match caches.marks.index() {
				Some(index) => f(index),
				None => f(&LineIndex::new()),
			},
			Err(stale) => f(&build_index(&stale.into_marks())),
		}
	}

	/// Applies a source change notification.
	///
	/// With both snapshots present the caches are patched in place; otherwise
	/// they are dropped. A repaint is requested either way.
	pub fn on_source_changed(&self, change: MarkChange) {
		match (change.old, change.new) {
			(Some(old), Some(new)) => {
				self.caches.lock().marks.patch(&old, &new);
				self.repaint.request(RepaintFlags::empty());
			}
			(old, new) => {
				warn!(
					has_old = old.is_some(),
					has_new = new.is_some(),
					"Incomplete mark change notification; invalidating mark cache"
				);
				self.invalidate();
				self.repaint.request(RepaintFlags::MARKS);
			}
		}
	}

	/// Collects each source's marks without holding the cache lock.
	///
	/// A source that panics contributes nothing.
	fn gather(&self) -> Vec<Vec<Arc<Mark>>> {
		let sources: Vec<_> = self
			.attachment
			.lock()
			.sources
			.iter()
			.map(|(source, _)| Arc::clone(source))
			.collect();

		let snapshots: Vec<_> = sources
			.iter()
			.enumerate()
			.map(|(idx, source)| {
				catch_unwind(AssertUnwindSafe(|| source.marks())).unwrap_or_else(|_| {
					warn!(source = idx, "Mark source panicked; ignoring its marks");
					Vec::new()
				})
			})
			.collect();
		let marks: usize = snapshots.iter().map(Vec::len).sum();
		debug!(sources = sources.len(), marks, "Gathered marks");
		snapshots
	}
}

impl MarkListener for MarkAggregator {
	fn marks_changed(&self, change: MarkChange) {
		self.on_source_changed(change);
	}
}

impl StatusListener for MarkAggregator {
	fn status_changed(&self) {
		self.repaint.request(RepaintFlags::empty());
	}
}

impl Drop for MarkAggregator {
	fn drop(&mut self) {
		self.attachment.get_mut().detach();
	}
}
