//! Adaptor over the legacy per-line annotation store.
//!
//! The store is walked with "next annotated line" calls. Each visited line
//! contributes its active annotation followed by its passive ones. The walk
//! does not trust the store: a line lower than the previous answer aborts the
//! scan, and more than `limit` consecutive answers that fail to advance abort
//! it as well.

use std::collections::VecDeque;

use tracing::warn;
use xeno_marks::is_more_important;

use crate::document::{AnnotationStore, LegacyAnnotation};

/// A restartable scan of the legacy annotations in `[start, end]`.
///
/// Every call to [`LegacyScan::iter`] starts a fresh, finite, lazy walk.
#[derive(Clone, Copy)]
pub struct LegacyScan<'a> {
	store: &'a dyn AnnotationStore,
	start: usize,
	end: usize,
	limit: u32,
}

impl<'a> LegacyScan<'a> {
	/// Scans lines `start..=end`, tolerating `limit` stalled answers in a row.
	pub fn new(store: &'a dyn AnnotationStore, start: usize, end: usize, limit: u32) -> Self {
		Self {
			store,
			start,
			end,
			limit,
		}
	}

	/// Scans the whole document.
	pub fn all(store: &'a dyn AnnotationStore, limit: u32) -> Self {
		Self::new(store, 0, usize::MAX, limit)
	}

	/// Starts a new walk.
	pub fn iter(&self) -> LegacyIter<'a> {
		LegacyIter {
			store: self.store,
			cursor: self.start,
			end: self.end,
			limit: self.limit,
			previous: None,
			stalls: 0,
			buffer: VecDeque::new(),
			done: self.start > self.end,
		}
	}

	/// Most important annotation with a significant status.
	///
	/// On a full tie the first one visited wins.
	pub fn most_important(&self) -> Option<LegacyAnnotation> {
		self.iter()
			.filter(|a| a.status.is_significant())
			.fold(None, |best: Option<LegacyAnnotation>, a| match best {
				Some(b) if !is_more_important(&a, &b) => Some(b),
				_ => Some(a),
			})
	}

	/// First annotated line of the scan, honoring the same defenses.
	pub fn first_line(&self) -> Option<usize> {
		let mut iter = self.iter();
		if iter.advance() { iter.previous } else { None }
	}
}

impl<'s, 'a> IntoIterator for &'s LegacyScan<'a> {
	type Item = LegacyAnnotation;
	type IntoIter = LegacyIter<'a>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Lazy walk produced by [`LegacyScan::iter`].
pub struct LegacyIter<'a> {
	store: &'a dyn AnnotationStore,
	cursor: usize,
	end: usize,
	limit: u32,
	previous: Option<usize>,
	stalls: u32,
	buffer: VecDeque<LegacyAnnotation>,
	done: bool,
}

impl LegacyIter<'_> {
	/// Pulls the next annotated line into the buffer. Returns false when the
	/// walk is over.
	fn advance(&mut self) -> bool {
		loop {
			if self.done {
				return false;
			}
			let Some(line) = self.store.next_line_with_annotation(self.cursor) else {
				self.done = true;
				return false;
			};
			if let Some(previous) = self.previous
				&& line < previous
			{
				warn!(line, previous, "Legacy annotation store went backwards; aborting scan");
				self.done = true;
				return false;
			}
			if line < self.cursor {
				self.stalls += 1;
				if self.stalls > self.limit {
					warn!(
						line,
						requested = self.cursor,
						stalls = self.stalls,
						"Legacy annotation store is not advancing; aborting scan"
					);
					self.done = true;
					return false;
				}
				continue;
			}
			if line > self.end {
				self.done = true;
				return false;
			}

			self.stalls = 0;
			self.previous = Some(line);
			match line.checked_add(1) {
				Some(next) => self.cursor = next,
				None => self.done = true,
			}
			self.buffer.extend(self.store.active_annotation(line));
			self.buffer.extend(self.store.passive_annotations(line));
			return true;
		}
	}
}

impl Iterator for LegacyIter<'_> {
	type Item = LegacyAnnotation;

	fn next(&mut self) -> Option<Self::Item> {
		loop {
			if let Some(annotation) = self.buffer.pop_front() {
				return Some(annotation);
			}
			if !self.advance() {
				return None;
			}
		}
	}
}

#[cfg(test)]
mod tests;
