//! The `HipsTileFormat` enum: image encodings a HiPS tree may store its tiles in.
//!
//! # Examples
//!
//! ```
//! use hips2cog_core::HipsTileFormat;
//!
//! assert_eq!(HipsTileFormat::Jpeg.extension(), "jpg");
//! assert_eq!(HipsTileFormat::parse_str("PNG").unwrap(), HipsTileFormat::Png);
//! assert_eq!(HipsTileFormat::from_properties("png jpeg").unwrap(), HipsTileFormat::Png);
//! ```

use anyhow::{Result, bail};
#[cfg(feature = "cli")]
use clap::ValueEnum;
use std::fmt::{Display, Formatter};

/// Tile encodings found in HiPS trees. FITS tiles are not supported.
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HipsTileFormat {
	#[default]
	Jpeg,
	Png,
	Webp,
}

impl HipsTileFormat {
	pub fn as_str(&self) -> &str {
		match self {
			HipsTileFormat::Jpeg => "jpeg",
			HipsTileFormat::Png => "png",
			HipsTileFormat::Webp => "webp",
		}
	}

	/// File extension of tiles in this format, without the leading dot.
	pub fn extension(&self) -> &str {
		match self {
			HipsTileFormat::Jpeg => "jpg",
			HipsTileFormat::Png => "png",
			HipsTileFormat::Webp => "webp",
		}
	}

	/// Parses a single format name (case-insensitive, `jpg` and `jpeg` are accepted).
	pub fn parse_str(value: &str) -> Result<HipsTileFormat> {
		Ok(match value.to_lowercase().trim() {
			"jpg" | "jpeg" => HipsTileFormat::Jpeg,
			"png" => HipsTileFormat::Png,
			"webp" => HipsTileFormat::Webp,
			_ => bail!("Unknown HiPS tile format '{value}'. Expected jpeg, png or webp"),
		})
	}

	/// Picks the first supported format of a `hips_tile_format` property value such as `"fits png jpeg"`.
	pub fn from_properties(value: &str) -> Result<HipsTileFormat> {
		for token in value.split_whitespace() {
			if let Ok(format) = HipsTileFormat::parse_str(token) {
				return Ok(format);
			}
		}
		bail!("hips_tile_format '{value}' lists no supported image format")
	}
}

impl Display for HipsTileFormat {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
