//! Producer registry.
//!
//! Maps content types to the factories that create mark sources and status
//! providers for a document. Factories registered without a content type
//! apply to every document. The registry is an ordinary value constructed
//! once and shared with every stripe.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::document::StripeDocument;
use crate::source::{MarkSource, StatusProvider};

/// Creates a mark source for a document, or declines with `None`.
pub type MarkSourceFactory =
	Arc<dyn Fn(&Arc<dyn StripeDocument>) -> Option<Arc<dyn MarkSource>> + Send + Sync>;

/// Creates a status provider for a document, or declines with `None`.
pub type StatusProviderFactory =
	Arc<dyn Fn(&Arc<dyn StripeDocument>) -> Option<Arc<dyn StatusProvider>> + Send + Sync>;

/// Factories registered under one scope.
struct Scoped<F> {
	global: Vec<F>,
	by_type: FxHashMap<String, Vec<F>>,
	/// Resolved lists per content type; dropped on every registration.
	resolved: FxHashMap<String, Arc<[F]>>,
}

impl<F> Default for Scoped<F> {
	fn default() -> Self {
		Self {
			global: Vec::new(),
			by_type: FxHashMap::default(),
			resolved: FxHashMap::default(),
		}
	}
}

impl<F: Clone> Scoped<F> {
	fn register(&mut self, content_type: Option<&str>, factory: F) {
		match content_type {
			Some(ty) => self.by_type.entry(ty.to_string()).or_default().push(factory),
			None => self.global.push(factory),
		}
		self.resolved.clear();
	}

	fn lookup(&self, content_type: &str) -> Option<Arc<[F]>> {
		self.resolved.get(content_type).cloned()
	}

	fn resolve(&mut self, content_type: &str) -> Arc<[F]> {
		if let Some(hit) = self.resolved.get(content_type) {
			return Arc::clone(hit);
		}
		let list: Arc<[F]> = self
			.by_type
			.get(content_type)
			.into_iter()
			.flatten()
			.chain(self.global.iter())
			.cloned()
			.collect();
		self.resolved.insert(content_type.to_string(), Arc::clone(&list));
		list
	}
}

/// Registry of mark-source and status-provider factories.
#[derive(Default)]
pub struct SourceRegistry {
	marks: RwLock<Scoped<MarkSourceFactory>>,
	status: RwLock<Scoped<StatusProviderFactory>>,
}

impl SourceRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a mark-source factory for `content_type`, or for every
	/// document when `None`.
	pub fn register_marks<F>(&self, content_type: Option<&str>, factory: F)
	where
		F: Fn(&Arc<dyn StripeDocument>) -> Option<Arc<dyn MarkSource>> + Send + Sync + 'static,
	{
		self.marks.write().register(content_type, Arc::new(factory));
	}

	/// Registers a status-provider factory for `content_type`, or for every
	/// document when `None`.
	pub fn register_status<F>(&self, content_type: Option<&str>, factory: F)
	where
		F: Fn(&Arc<dyn StripeDocument>) -> Option<Arc<dyn StatusProvider>> + Send + Sync + 'static,
	{
		self.status.write().register(content_type, Arc::new(factory));
	}

	/// Factories applicable to `content_type`: type-scoped first, then global.
	pub fn mark_factories(&self, content_type: &str) -> Arc<[MarkSourceFactory]> {
		if let Some(hit) = self.marks.read().lookup(content_type) {
			return hit;
		}
		self.marks.write().resolve(content_type)
	}

	/// Status factories applicable to `content_type`: type-scoped first, then global.
	pub fn status_factories(&self, content_type: &str) -> Arc<[StatusProviderFactory]> {
		if let Some(hit) = self.status.read().lookup(content_type) {
			return hit;
		}
		self.status.write().resolve(content_type)
	}

	/// Instantiates every applicable mark source for `doc`.
	pub fn create_mark_sources(&self, doc: &Arc<dyn StripeDocument>) -> Vec<Arc<dyn MarkSource>> {
		let sources: Vec<_> = self
			.mark_factories(doc.content_type())
			.iter()
			.filter_map(|factory| factory(doc))
			.collect();
		debug!(content_type = doc.content_type(), count = sources.len(), "Resolved mark sources");
		sources
	}

	/// Instantiates every applicable status provider for `doc`.
	pub fn create_status_providers(
		&self,
		doc: &Arc<dyn StripeDocument>,
	) -> Vec<Arc<dyn StatusProvider>> {
		self.status_factories(doc.content_type())
			.iter()
			.filter_map(|factory| factory(doc))
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use xeno_marks::UpToDate;

	use super::*;
	use crate::source::{MarkSet, StatusCell};

	struct Doc(&'static str);

	impl StripeDocument for Doc {
		fn content_type(&self) -> &str {
			self.0
		}
	}

	fn doc(ty: &'static str) -> Arc<dyn StripeDocument> {
		Arc::new(Doc(ty))
	}

	#[test]
	fn scoped_and_global_factories() {
		let registry = SourceRegistry::new();
		registry.register_marks(Some("text/x-rust"), |_| Some(Arc::new(MarkSet::new()) as _));
		registry.register_marks(None, |_| Some(Arc::new(MarkSet::new()) as _));

		assert_eq!(registry.create_mark_sources(&doc("text/x-rust")).len(), 2);
		assert_eq!(registry.create_mark_sources(&doc("text/plain")).len(), 1);
	}

	#[test]
	fn declining_factory_is_skipped() {
		let registry = SourceRegistry::new();
		registry.register_status(None, |_| None);
		registry.register_status(None, |_| Some(Arc::new(StatusCell::new(UpToDate::Ok)) as _));

		assert_eq!(registry.create_status_providers(&doc("text/plain")).len(), 1);
	}

	#[test]
	fn registration_drops_resolved_cache() {
		let registry = SourceRegistry::new();
		assert!(registry.mark_factories("text/x-rust").is_empty());

		registry.register_marks(Some("text/x-rust"), |_| None);
		assert_eq!(registry.mark_factories("text/x-rust").len(), 1);
	}

	#[test]
	fn resolved_lists_are_shared() {
		let registry = SourceRegistry::new();
		registry.register_marks(None, |_| None);

		let a = registry.mark_factories("text/plain");
		let b = registry.mark_factories("text/plain");
		assert!(Arc::ptr_eq(&a, &b));
	}
}
