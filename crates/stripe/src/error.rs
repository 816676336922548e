//! Error types for stripe configuration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading a [`StripeConfig`](crate::StripeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Parse(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A field holds a value the stripe cannot work with.
	#[error("invalid value for {field}: {reason}")]
	Invalid {
		/// Offending field name.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
