//! Core data model for the error stripe: positional status marks, their
//! severities, and the ranking rules used to pick the most important one.

/// RGB colors for stripe rows.
pub mod color;
/// Marks and the line spans they cover.
pub mod mark;
/// Severity and freshness levels.
pub mod status;

pub use color::{Color, ColorParseError};
pub use mark::{LineSpan, Mark, MarkId, MarkKind, Ranked, is_more_important, more_important};
pub use status::{Status, UpToDate};
