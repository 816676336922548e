use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a `#rrggbb` color string is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color format: {0} (expected #rrggbb)")]
pub struct ColorParseError(pub String);

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
	/// Red channel.
	pub r: u8,
	/// Green channel.
	pub g: u8,
	/// Blue channel.
	pub b: u8,
}

impl Color {
	/// Creates a color from its channels.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b }
	}
}

impl FromStr for Color {
	type Err = ColorParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let err = || ColorParseError(s.to_string());
		let hex = s.strip_prefix('#').ok_or_else(err)?;
		if hex.len() != 6 || !hex.is_ascii() {
			return Err(err());
		}
		let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
		Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
	}
}

impl TryFrom<String> for Color {
	type Error = ColorParseError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Color> for String {
	fn from(color: Color) -> Self {
		color.to_string()
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}
