//! Error and warning statistics for the stripe tooltip.

use std::collections::BTreeMap;
use std::fmt;

/// Histogram key for entries that carry no description.
pub const UNDESCRIBED: &str = "<no description>";

/// Exact `description -> count` tally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
	counts: BTreeMap<String, usize>,
}

impl Histogram {
	/// Counts one entry under `description`, or [`UNDESCRIBED`].
	pub fn record(&mut self, description: Option<&str>) {
		let key = description.unwrap_or(UNDESCRIBED);
		match self.counts.get_mut(key) {
			Some(count) => *count += 1,
			None => {
				self.counts.insert(key.to_string(), 1);
			}
		}
	}

	/// Count recorded for `description`.
	pub fn get(&self, description: &str) -> usize {
		self.counts.get(description).copied().unwrap_or(0)
	}

	/// Number of distinct descriptions.
	pub fn len(&self) -> usize {
		self.counts.len()
	}

	/// Returns true if nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.counts.is_empty()
	}

	/// Sum of all counts.
	pub fn total(&self) -> usize {
		self.counts.values().sum()
	}

	/// Entries in description order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
		self.counts.iter().map(|(k, v)| (k.as_str(), *v))
	}

	/// The `limit` most frequent entries, ties broken by description.
	pub fn display(&self, limit: usize) -> HistogramDisplay<'_> {
		let mut entries: Vec<_> = self.iter().collect();
		entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		let hidden = entries.len().saturating_sub(limit);
		entries.truncate(limit);
		HistogramDisplay { entries, hidden }
	}
}

/// A capped view over a [`Histogram`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistogramDisplay<'a> {
	/// Shown entries, most frequent first.
	pub entries: Vec<(&'a str, usize)>,
	/// Distinct descriptions left out.
	pub hidden: usize,
}

impl fmt::Display for HistogramDisplay<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (description, count) in &self.entries {
			writeln!(f, "{count} \u{00d7} {description}")?;
		}
		if self.hidden > 0 {
			writeln!(f, "\u{2026} and {} more", self.hidden)?;
		}
		Ok(())
	}
}

/// Error and warning counts with per-description histograms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripeStatistics {
	/// Number of error-level entries.
	pub errors: usize,
	/// Number of warning-level entries.
	pub warnings: usize,
	/// Errors by description.
	pub error_histogram: Histogram,
	/// Warnings by description.
	pub warning_histogram: Histogram,
}

impl StripeStatistics {
	/// One-line summary, e.g. `1 error, 3 warnings`.
	pub fn summary(&self) -> String {
		format!(
			"{}, {}",
			plural(self.errors, "error"),
			plural(self.warnings, "warning")
		)
	}

	/// Summary line followed by both histograms, each capped at `limit`
	/// entries with an overflow marker.
	pub fn describe(&self, limit: usize) -> String {
		let mut out = self.summary();
		out.push('\n');
		for (title, histogram) in [("Errors", &self.error_histogram), ("Warnings", &self.warning_histogram)] {
			if !histogram.is_empty() {
				out.push_str(&format!("{title}:\n{}", histogram.display(limit)));
			}
		}
		out.truncate(out.trim_end().len());
		out
	}
}

fn plural(count: usize, noun: &str) -> String {
	if count == 1 {
		format!("1 {noun}")
	} else {
		format!("{count} {noun}s")
	}
}
