//! Per-view error stripe.
//!
//! [`ErrorStripe`] wires one [`MarkAggregator`], [`StatusSummarizer`],
//! [`CoordinateMapper`] and [`RepaintScheduler`] together for a (document,
//! viewer) pairing. Coalesced repaints clear the shared caches and are handed
//! to the rendering thread as [`RedrawRequest`]s.

use std::ops::RangeInclusive;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::trace;
use xeno_marks::{Color, Ranked, Status, UpToDate};

use crate::aggregator::MarkAggregator;
use crate::cache::{SharedCaches, StripeCaches};
use crate::config::StripeConfig;
use crate::coords::{CoordinateMapper, StripeLayout};
use crate::document::{DocumentGeometry, StripeDocument};
use crate::registry::SourceRegistry;
use crate::repaint::{RepaintFlags, RepaintHandler, RepaintScheduler, RepaintTrigger};
use crate::stats::StripeStatistics;
use crate::summary::{StatusSummarizer, StripeMark};

/// One coalesced redraw for the rendering thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedrawRequest {
	/// Caches that were cleared before the request was sent.
	pub cleared: RepaintFlags,
}

/// Receiving end of a stripe's redraw queue.
pub type RedrawReceiver = mpsc::UnboundedReceiver<RedrawRequest>;

/// Clears caches and forwards the redraw once the quiet period elapses.
struct RepaintSink {
	caches: SharedCaches,
	redraw: mpsc::UnboundedSender<RedrawRequest>,
}

impl RepaintHandler for RepaintSink {
	fn repaint(&self, flags: RepaintFlags) {
		{
			let mut caches = self.caches.lock();
			if flags.contains(RepaintFlags::MARKS) {
				caches.marks.invalidate();
			}
			if flags.contains(RepaintFlags::COORDINATES) {
				caches.coords.clear();
			}
		}
		if self.redraw.send(RedrawRequest { cleared: flags }).is_err() {
			trace!("Redraw receiver dropped");
		}
	}
}

/// Error stripe for one document in one view.
pub struct ErrorStripe {
	config: StripeConfig,
	aggregator: Arc<MarkAggregator>,
	summarizer: StatusSummarizer,
	mapper: CoordinateMapper,
	scheduler: RepaintScheduler,
}

impl ErrorStripe {
	/// Creates a detached stripe whose repaint timer runs on `runtime`.
	pub fn new(
		config: StripeConfig,
		registry: Arc<SourceRegistry>,
		runtime: &Handle,
	) -> (Self, RedrawReceiver) {
		let caches: SharedCaches = Arc::new(Mutex::new(StripeCaches::default()));
		let (tx, rx) = mpsc::unbounded_channel();
		let sink = Arc::new(RepaintSink {
			caches: Arc::clone(&caches),
			redraw: tx,
		});
		let scheduler = RepaintScheduler::spawn(runtime, config.quiet_period(), sink);
		let aggregator = MarkAggregator::new(
			registry,
			Arc::clone(&caches),
			Arc::new(scheduler.clone()),
		);
		let summarizer = StatusSummarizer::new(Arc::clone(&aggregator), config.legacy_scan_limit);
		let mapper = CoordinateMapper::new(caches, StripeLayout::from(&config));

		let stripe = Self {
			config,
			aggregator,
			summarizer,
			mapper,
			scheduler,
		};
		(stripe, rx)
	}

	/// The active configuration.
	pub fn config(&self) -> &StripeConfig {
		&self.config
	}

	/// The underlying aggregator.
	pub fn aggregator(&self) -> &Arc<MarkAggregator> {
		&self.aggregator
	}

	/// Attaches to `doc`, replacing any previous document.
	pub fn set_document(&self, doc: Arc<dyn StripeDocument>) {
		self.aggregator.register(doc);
	}

	/// Re-gathers producers after the attached document's content type
	/// changed.
	pub fn content_type_changed(&self) {
		if let Some(doc) = self.aggregator.document() {
			self.aggregator.register(doc);
		}
	}

	/// Detaches from every producer.
	pub fn unregister(&self) {
		self.aggregator.unregister();
	}

	/// See [`StatusSummarizer::most_important_mark_in_range`].
	pub fn most_important_mark_in_range(&self, a: usize, b: usize) -> Option<StripeMark> {
		self.summarizer.most_important_mark_in_range(a, b)
	}

	/// See [`StatusSummarizer::next_used_line`].
	pub fn next_used_line(&self, from: usize) -> Option<usize> {
		self.summarizer.next_used_line(from)
	}

	/// See [`StatusSummarizer::total_status`].
	pub fn total_status(&self) -> Status {
		self.summarizer.total_status()
	}

	/// See [`StatusSummarizer::total_status_type`].
	pub fn total_status_type(&self) -> UpToDate {
		self.summarizer.total_status_type()
	}

	/// See [`StatusSummarizer::compute_statistics`].
	pub fn compute_statistics(&self) -> StripeStatistics {
		self.summarizer.compute_statistics()
	}

	/// See [`StatusSummarizer::caret_line`].
	pub fn caret_line(&self) -> Option<usize> {
		self.summarizer.caret_line()
	}

	/// Top pixel of the row painted for `line`.
	pub fn line_to_y(&self, geom: &dyn DocumentGeometry, line: usize) -> Option<u32> {
		self.mapper.line_to_y(geom, line)
	}

	/// Lines painted on the row containing pixel `y`.
	pub fn y_to_line_range(
		&self,
		geom: &dyn DocumentGeometry,
		y: u32,
	) -> Option<RangeInclusive<usize>> {
		self.mapper.y_to_line_range(geom, y)
	}

	/// Most important mark painted on the row containing pixel `y`.
	pub fn mark_at_y(&self, geom: &dyn DocumentGeometry, y: u32) -> Option<StripeMark> {
		let lines = self.mapper.y_to_line_range(geom, y)?;
		self.summarizer.most_important_mark_in_range(*lines.start(), *lines.end())
	}

	/// Tooltip for pixel `y`.
	///
	/// Above the first row this describes the up-to-date indicator and the
	/// document statistics, with each histogram capped at
	/// [`StripeConfig::histogram_limit`] entries. Elsewhere it is the
	/// description of the mark under the pointer.
	pub fn tooltip(&self, geom: &dyn DocumentGeometry, y: u32) -> Option<String> {
		if y < self.config.top_offset {
			return Some(self.indicator_tooltip());
		}
		self.mark_at_y(geom, y)?.description().map(str::to_string)
	}

	/// Freshness and capped statistics shown over the up-to-date indicator.
	pub fn indicator_tooltip(&self) -> String {
		let freshness = self.total_status_type().description();
		let stats = self.compute_statistics();
		format!("{freshness}: {}", stats.describe(self.config.histogram_limit))
	}

	/// Color to paint `mark` with: its own override, then the configured
	/// status color.
	pub fn color_of(&self, mark: &StripeMark) -> Option<Color> {
		let own = match mark {
			StripeMark::Source(m) => m.color,
			StripeMark::Legacy(a) => a.color,
		};
		own.or_else(|| self.config.colors.resolve(mark.status()))
	}

	/// Schedules a repaint that clears every cache.
	pub fn invalidate(&self) {
		self.scheduler.request(RepaintFlags::all());
	}

	/// Drops the merged marks and line index right away.
	pub fn clear(&self) {
		self.aggregator.invalidate();
	}
}
