use serde::{Deserialize, Serialize};

use crate::Color;

/// Severity carried by a mark.
///
/// Variants are declared in ascending order of importance so that the derived
/// [`Ord`] matches the stripe's ranking: `None < Ok < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	/// No status; ignored by ranking.
	#[default]
	None,
	/// Explicitly clean.
	Ok,
	/// Warning-level problem.
	Warning,
	/// Error-level problem.
	Error,
}

impl Status {
	/// Combines two statuses, keeping the more severe one.
	///
	/// The fold is monotonic: compounding never lowers the result.
	pub fn compound(self, other: Status) -> Status {
		self.max(other)
	}

	/// Stock stripe color for this status. [`Status::None`] has no color.
	pub const fn default_color(self) -> Option<Color> {
		match self {
			Self::None => None,
			Self::Ok => Some(Color::rgb(0x00, 0xc8, 0x00)),
			Self::Warning => Some(Color::rgb(0xff, 0xc8, 0x00)),
			Self::Error => Some(Color::rgb(0xff, 0x00, 0x00)),
		}
	}

	/// Returns true for statuses that take part in "most important" ranking.
	pub const fn is_significant(self) -> bool {
		!matches!(self, Self::None)
	}
}

/// Freshness of a document's diagnostics as reported by status providers.
///
/// Ordered `Ok < Processing < Dirty`; the aggregate of several providers is the
/// worst of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpToDate {
	/// Diagnostics reflect the current document content.
	Ok,
	/// A producer is currently recomputing.
	Processing,
	/// Diagnostics are stale.
	Dirty,
}

impl UpToDate {
	/// Returns the less fresh of two states.
	pub fn worst(self, other: UpToDate) -> UpToDate {
		self.max(other)
	}

	/// Short human-readable description for the indicator tooltip.
	pub const fn description(self) -> &'static str {
		match self {
			Self::Ok => "Analysis complete",
			Self::Processing => "Analysis in progress",
			Self::Dirty => "Analysis out of date",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_orders_by_severity() {
		assert!(Status::None < Status::Ok);
		assert!(Status::Ok < Status::Warning);
		assert!(Status::Warning < Status::Error);
	}

	#[test]
	fn compound_is_monotonic() {
		let fold = |items: &[Status]| items.iter().fold(Status::Ok, |acc, s| acc.compound(*s));

		assert_eq!(fold(&[]), Status::Ok);
		assert_eq!(fold(&[Status::Ok, Status::Warning]), Status::Warning);
		assert_eq!(fold(&[Status::Warning, Status::Error]), Status::Error);
		assert_eq!(fold(&[Status::Error, Status::None, Status::Ok]), Status::Error);
	}

	#[test]
	fn up_to_date_worst() {
		assert_eq!(UpToDate::Ok.worst(UpToDate::Processing), UpToDate::Processing);
		assert_eq!(UpToDate::Dirty.worst(UpToDate::Processing), UpToDate::Dirty);
		assert_eq!(UpToDate::Ok.worst(UpToDate::Ok), UpToDate::Ok);
	}

	#[test]
	fn none_has_no_color() {
		assert_eq!(Status::None.default_color(), None);
		assert!(Status::Error.default_color().is_some());
	}
}
