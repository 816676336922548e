//! Stripe configuration.
//!
//! Geometry, timing and scan limits are read from TOML. Every field has a
//! default, so an empty document yields [`StripeConfig::default`].

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use xeno_marks::{Color, Status};

use crate::error::{ConfigError, Result};

/// Tunables for one error stripe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StripeConfig {
	/// Height in pixels of one mark row.
	pub mark_height: u32,
	/// Gap in pixels between mark rows in the block-compressed regime.
	pub separator: u32,
	/// Pixels reserved above the first row (up-to-date indicator area).
	pub top_offset: u32,
	/// Pixels reserved below the last row.
	pub bottom_offset: u32,
	/// Quiet period before a coalesced repaint fires, in milliseconds.
	pub quiet_period_ms: u64,
	/// Consecutive non-advancing legacy "next line" answers tolerated before a
	/// scan is aborted.
	pub legacy_scan_limit: u32,
	/// Distinct descriptions shown per statistics histogram.
	pub histogram_limit: usize,
	/// Per-status color overrides.
	pub colors: StatusColors,
}

impl Default for StripeConfig {
	fn default() -> Self {
		Self {
			mark_height: 3,
			separator: 1,
			top_offset: 16,
			bottom_offset: 4,
			quiet_period_ms: 50,
			legacy_scan_limit: 100,
			histogram_limit: 20,
			colors: StatusColors::default(),
		}
	}
}

/// Optional color overrides keyed by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusColors {
	/// Color for [`Status::Ok`] rows.
	pub ok: Option<Color>,
	/// Color for [`Status::Warning`] rows.
	pub warning: Option<Color>,
	/// Color for [`Status::Error`] rows.
	pub error: Option<Color>,
}

impl StatusColors {
	/// Configured color for `status`, falling back to the stock color.
	pub fn resolve(&self, status: Status) -> Option<Color> {
		let configured = match status {
			Status::None => None,
			Status::Ok => self.ok,
			Status::Warning => self.warning,
			Status::Error => self.error,
		};
		configured.or_else(|| status.default_color())
	}
}

impl StripeConfig {
	/// Parses and validates a TOML document.
	pub fn from_toml_str(src: &str) -> Result<Self> {
		let config: Self = toml::from_str(src)?;
		config.validate()?;
		Ok(config)
	}

	/// Reads, parses and validates a TOML file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let src = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&src)
	}

	/// Rejects values the mapper and scanner cannot work with.
	pub fn validate(&self) -> Result<()> {
		if self.mark_height == 0 {
			return Err(ConfigError::Invalid {
				field: "mark_height",
				reason: "must be at least one pixel",
			});
		}
		if self.legacy_scan_limit == 0 {
			return Err(ConfigError::Invalid {
				field: "legacy_scan_limit",
				reason: "must allow at least one retry",
			});
		}
		if self.histogram_limit == 0 {
			return Err(ConfigError::Invalid {
				field: "histogram_limit",
				reason: "must show at least one entry",
			});
		}
		Ok(())
	}

	/// Quiet period as a [`Duration`].
	pub fn quiet_period(&self) -> Duration {
		Duration::from_millis(self.quiet_period_ms)
	}
}
