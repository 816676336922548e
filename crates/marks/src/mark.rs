use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use crate::{Color, Status};

static NEXT_MARK_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a mark.
///
/// Two marks with the same id are the same mark, regardless of their contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkId(pub u64);

impl MarkId {
	/// Allocates a process-unique id.
	pub fn fresh() -> Self {
		Self(NEXT_MARK_ID.fetch_add(1, AtomicOrdering::Relaxed))
	}
}

/// How a mark is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkKind {
	/// Regular status row.
	#[default]
	Normal,
	/// Caret position indicator; never ranked.
	Caret,
}

/// Inclusive range of 0-based document lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineSpan {
	start: usize,
	end: usize,
}

impl LineSpan {
	/// Creates a span, swapping reversed bounds.
	pub fn new(start: usize, end: usize) -> Self {
		if start <= end {
			Self { start, end }
		} else {
			Self { start: end, end: start }
		}
	}

	/// Span covering a single line.
	pub const fn line(line: usize) -> Self {
		Self { start: line, end: line }
	}

	/// First line (inclusive).
	pub const fn start(&self) -> usize {
		self.start
	}

	/// Last line (inclusive).
	pub const fn end(&self) -> usize {
		self.end
	}

	/// Iterates every covered line.
	pub fn lines(&self) -> RangeInclusive<usize> {
		self.start..=self.end
	}

	/// Number of covered lines.
	pub const fn len(&self) -> usize {
		self.end - self.start + 1
	}

	/// A span always covers at least one line.
	pub const fn is_empty(&self) -> bool {
		false
	}

	/// Returns true if `line` lies within the span.
	pub const fn contains(&self, line: usize) -> bool {
		self.start <= line && line <= self.end
	}

	/// Returns true if the span intersects `[start, end]`.
	pub const fn overlaps(&self, start: usize, end: usize) -> bool {
		self.start <= end && start <= self.end
	}
}

/// A positional status indicator attached to a span of lines.
///
/// Marks are immutable once published; a producer changes its marks by
/// replacing them. Equality and hashing go through [`MarkId`] only.
#[derive(Debug, Clone)]
pub struct Mark {
	/// Identity.
	pub id: MarkId,
	/// Covered lines.
	pub span: LineSpan,
	/// Severity.
	pub status: Status,
	/// Tie-break among equal severities; lower is more important.
	pub priority: i32,
	/// Overrides the status color when set.
	pub color: Option<Color>,
	/// Painting kind.
	pub kind: MarkKind,
	/// Short description used by tooltips and statistics.
	pub description: Option<String>,
}

impl Mark {
	/// Creates a normal mark with a fresh id and zero priority.
	pub fn new(span: LineSpan, status: Status) -> Self {
		Self {
			id: MarkId::fresh(),
			span,
			status,
			priority: 0,
			color: None,
			kind: MarkKind::Normal,
			description: None,
		}
	}

	/// Creates a caret indicator for `line`.
	pub fn caret(line: usize) -> Self {
		Self {
			kind: MarkKind::Caret,
			..Self::new(LineSpan::line(line), Status::None)
		}
	}

	/// Sets an explicit identity.
	pub fn with_id(mut self, id: MarkId) -> Self {
		self.id = id;
		self
	}

	/// Sets the tie-break priority.
	pub fn with_priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}

	/// Sets a color override.
	pub fn with_color(mut self, color: Color) -> Self {
		self.color = Some(color);
		self
	}

	/// Sets the description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Color override if any, otherwise the status color.
	pub fn effective_color(&self) -> Option<Color> {
		self.color.or_else(|| self.status.default_color())
	}

	/// Returns true for caret indicators.
	pub fn is_caret(&self) -> bool {
		self.kind == MarkKind::Caret
	}
}

impl PartialEq for Mark {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}

impl Eq for Mark {}

impl Hash for Mark {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state);
	}
}

/// Anything that can be ranked on the stripe.
pub trait Ranked {
	/// Severity.
	fn status(&self) -> Status;
	/// Tie-break; lower wins.
	fn priority(&self) -> i32;
}

impl Ranked for Mark {
	fn status(&self) -> Status {
		self.status
	}

	fn priority(&self) -> i32 {
		self.priority
	}
}

impl<T: Ranked + ?Sized> Ranked for &T {
	fn status(&self) -> Status {
		(**self).status()
	}

	fn priority(&self) -> i32 {
		(**self).priority()
	}
}

impl<T: Ranked + ?Sized> Ranked for std::sync::Arc<T> {
	fn status(&self) -> Status {
		(**self).status()
	}

	fn priority(&self) -> i32 {
		(**self).priority()
	}
}

/// Orders two ranked items: severity first, then lower priority.
///
/// `Ordering::Greater` means `a` is more important than `b`.
pub fn more_important(a: &impl Ranked, b: &impl Ranked) -> Ordering {
	a.status()
		.cmp(&b.status())
		.then_with(|| b.priority().cmp(&a.priority()))
}

/// Returns true if `a` strictly outranks `b`. Full ties return false.
pub fn is_more_important(a: &impl Ranked, b: &impl Ranked) -> bool {
	more_important(a, b) == Ordering::Greater
}
