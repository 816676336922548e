//! Ranked queries over the aggregated marks and the legacy annotations.
//!
//! Plugin marks come from the aggregator's line index and legacy annotations
//! from a bounded forward scan of the document's annotation store. Every query
//! consults both paths. Caret marks live in the index but never take part in
//! ranking, the status fold or statistics.

use std::sync::Arc;

use xeno_marks::{Color, LineSpan, Mark, Ranked, Status, UpToDate, is_more_important};

use crate::aggregator::MarkAggregator;
use crate::document::LegacyAnnotation;
use crate::legacy::LegacyScan;
use crate::stats::StripeStatistics;

/// Result of a ranked query: a plugin mark or a legacy annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripeMark {
	/// Mark published by a mark source.
	Source(Arc<Mark>),
	/// Entry of the legacy annotation store.
	Legacy(LegacyAnnotation),
}

impl StripeMark {
	/// Lines covered.
	pub fn span(&self) -> LineSpan {
		match self {
			Self::Source(mark) => mark.span,
			Self::Legacy(annotation) => LineSpan::line(annotation.line),
		}
	}

	/// Short description, if any.
	pub fn description(&self) -> Option<&str> {
		match self {
			Self::Source(mark) => mark.description.as_deref(),
			Self::Legacy(annotation) => annotation.description.as_deref(),
		}
	}

	/// Color override if any, otherwise the status color.
	pub fn effective_color(&self) -> Option<Color> {
		match self {
			Self::Source(mark) => mark.effective_color(),
			Self::Legacy(annotation) => annotation.effective_color(),
		}
	}
}

impl Ranked for StripeMark {
	fn status(&self) -> Status {
		match self {
			Self::Source(mark) => mark.status,
			Self::Legacy(annotation) => annotation.status,
		}
	}

	fn priority(&self) -> i32 {
		match self {
			Self::Source(mark) => mark.priority,
			Self::Legacy(annotation) => annotation.priority,
		}
	}
}

/// Answers range, fold and statistics queries for one stripe.
pub struct StatusSummarizer {
	aggregator: Arc<MarkAggregator>,
	scan_limit: u32,
}

impl StatusSummarizer {
	/// Creates a summarizer over `aggregator`; `scan_limit` bounds legacy
	/// scans.
	pub fn new(aggregator: Arc<MarkAggregator>, scan_limit: u32) -> Self {
		Self {
			aggregator,
			scan_limit,
		}
	}

	/// Most important mark touching lines `a..=b`.
	///
	/// Ranks by status, then lower priority. Only lines that carry marks are
	/// visited. On a full tie the plugin mark beats the legacy annotation, and
	/// within each path the first one visited wins.
	pub fn most_important_mark_in_range(&self, a: usize, b: usize) -> Option<StripeMark> {
		let (start, end) = (a.min(b), a.max(b));

		let plugin = self.aggregator.with_line_index(|index| {
			let mut best: Option<&Arc<Mark>> = None;
			for mark in index.range(start..=end).flat_map(|(_, marks)| marks) {
				if mark.is_caret() || !mark.status.is_significant() {
					continue;
				}
				if best.is_none_or(|current| is_more_important(mark, current)) {
					best = Some(mark);
				}
			}
			best.cloned()
		});

		let legacy = self.aggregator.annotations().and_then(|store| {
			LegacyScan::new(store.as_ref(), start, end, self.scan_limit).most_important()
		});

		match (plugin, legacy) {
			(Some(mark), Some(annotation)) if is_more_important(&annotation, &mark) => {
				Some(StripeMark::Legacy(annotation))
			}
			(Some(mark), _) => Some(StripeMark::Source(mark)),
			(None, legacy) => legacy.map(StripeMark::Legacy),
		}
	}

	/// First line `>= from` carrying a mark or a legacy annotation.
	///
	/// Lines holding only caret marks are skipped. `None` means no further
	/// marks.
	pub fn next_used_line(&self, from: usize) -> Option<usize> {
		let plugin = self.aggregator.with_line_index(|index| {
			index
				.range(from..)
				.find(|(_, marks)| marks.iter().any(|m| !m.is_caret()))
				.map(|(line, _)| *line)
		});
		let legacy = self.aggregator.annotations().and_then(|store| {
			LegacyScan::new(store.as_ref(), from, usize::MAX, self.scan_limit).first_line()
		});

		match (plugin, legacy) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(a, b) => a.or(b),
		}
	}

	/// Severity of the whole document, folded from [`Status::Ok`].
	pub fn total_status(&self) -> Status {
		let mut total = self.aggregator.with_merged(|merged| {
			merged
				.values()
				.filter(|m| !m.is_caret())
				.fold(Status::Ok, |acc, m| acc.compound(m.status))
		});
		if let Some(store) = self.aggregator.annotations() {
			total = LegacyScan::all(store.as_ref(), self.scan_limit)
				.iter()
				.fold(total, |acc, a| acc.compound(a.status));
		}
		total
	}

	/// Freshness of the document's diagnostics.
	///
	/// With no status provider nothing vouches for the marks, so the result is
	/// [`UpToDate::Dirty`].
	pub fn total_status_type(&self) -> UpToDate {
		self.aggregator
			.provider_statuses()
			.into_iter()
			.reduce(UpToDate::worst)
			.unwrap_or(UpToDate::Dirty)
	}

	/// Error and warning counts with per-description histograms.
	pub fn compute_statistics(&self) -> StripeStatistics {
		let mut stats = StripeStatistics::default();
		let mut tally = |status: Status, description: Option<&str>| match status {
			Status::Error => {
				stats.errors += 1;
				stats.error_histogram.record(description);
			}
			Status::Warning => {
				stats.warnings += 1;
				stats.warning_histogram.record(description);
			}
			Status::None | Status::Ok => {}
		};

		self.aggregator.with_merged(|merged| {
			for mark in merged.values().filter(|m| !m.is_caret()) {
				tally(mark.status, mark.description.as_deref());
			}
		});
		if let Some(store) = self.aggregator.annotations() {
			for annotation in &LegacyScan::all(store.as_ref(), self.scan_limit) {
				tally(annotation.status, annotation.description.as_deref());
			}
		}
		stats
	}

	/// Line of the first caret mark, if any source publishes one.
	pub fn caret_line(&self) -> Option<usize> {
		self.aggregator.with_merged(|merged| {
			merged
				.values()
				.filter(|m| m.is_caret())
				.map(|m| m.span.start())
				.min()
		})
	}
}
