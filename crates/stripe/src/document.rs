//! Document-side collaborators consumed by the stripe.
//!
//! Text storage, line numbering and painting live outside this crate. The
//! stripe only sees them through the traits below.

use std::sync::Arc;

use xeno_marks::{Color, Ranked, Status};

/// The document a stripe is attached to.
pub trait StripeDocument: Send + Sync {
	/// Content type used to look up applicable producers, e.g. `text/x-rust`.
	fn content_type(&self) -> &str;

	/// The document's legacy per-line annotation store, if it has one.
	fn annotations(&self) -> Option<Arc<dyn AnnotationStore>> {
		None
	}
}

/// One entry of the legacy per-line annotation store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAnnotation {
	/// Line the annotation is attached to.
	pub line: usize,
	/// Severity.
	pub status: Status,
	/// Tie-break; lower wins.
	pub priority: i32,
	/// Color override.
	pub color: Option<Color>,
	/// Short description.
	pub description: Option<String>,
	/// True for the line's active annotation, false for passive ones.
	pub active: bool,
}

impl LegacyAnnotation {
	/// Creates an annotation with zero priority and no description.
	pub fn new(line: usize, status: Status) -> Self {
		Self {
			line,
			status,
			priority: 0,
			color: None,
			description: None,
			active: true,
		}
	}

	/// Sets the tie-break priority.
	pub fn with_priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}

	/// Sets the description.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());
		self
	}

	/// Marks the annotation as passive.
	pub fn passive(mut self) -> Self {
		self.active = false;
		self
	}

	/// Color override if any, otherwise the status color.
	pub fn effective_color(&self) -> Option<Color> {
		self.color.or_else(|| self.status.default_color())
	}
}

impl Ranked for LegacyAnnotation {
	fn status(&self) -> Status {
		self.status
	}

	fn priority(&self) -> i32 {
		self.priority
	}
}

/// Legacy per-line annotation store.
///
/// Each line has at most one active annotation and any number of passive
/// ones. Implementations are expected, but not trusted, to return strictly
/// increasing lines from [`AnnotationStore::next_line_with_annotation`].
pub trait AnnotationStore: Send + Sync {
	/// The active annotation on `line`.
	fn active_annotation(&self, line: usize) -> Option<LegacyAnnotation>;
	/// Passive annotations on `line`.
	fn passive_annotations(&self, line: usize) -> Vec<LegacyAnnotation>;
	/// Smallest annotated line `>= line`.
	fn next_line_with_annotation(&self, line: usize) -> Option<usize>;
}

/// Pixel geometry of the text view and the stripe.
///
/// A value of this trait is a snapshot taken under the document read-lock:
/// callers acquire the lock, pass the geometry in, and release the lock when
/// the query returns. Offsets are character offsets into the document.
pub trait DocumentGeometry {
	/// Number of lines in the document.
	fn line_count(&self) -> usize;
	/// Height of the stripe component in pixels.
	fn viewport_height(&self) -> u32;
	/// Height of the whole rendered document in pixels.
	fn content_height(&self) -> u32;
	/// Offset of the first character of `line`.
	fn line_start_offset(&self, line: usize) -> Option<usize>;
	/// Line containing `offset`.
	fn offset_to_line(&self, offset: usize) -> Option<usize>;
	/// Top pixel of the rendered row containing `offset`, if laid out.
	fn offset_to_y(&self, offset: usize) -> Option<u32>;
	/// Offset rendered at content pixel row `y`, if any.
	fn y_to_offset(&self, y: u32) -> Option<usize>;
}
