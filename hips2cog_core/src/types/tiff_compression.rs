//! The `TiffCompression` enum: block codecs the COG writer can emit.

use anyhow::{Result, bail};
#[cfg(feature = "cli")]
use clap::ValueEnum;
use std::fmt::{Display, Formatter};

/// Compression applied to every block of the output TIFF.
#[cfg_attr(feature = "cli", derive(ValueEnum))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TiffCompression {
	None,
	#[default]
	Deflate,
	Jpeg,
}

impl TiffCompression {
	pub fn as_str(&self) -> &str {
		match self {
			TiffCompression::None => "none",
			TiffCompression::Deflate => "deflate",
			TiffCompression::Jpeg => "jpeg",
		}
	}

	/// Value of the TIFF `Compression` tag (259).
	pub fn tag_value(&self) -> u16 {
		match self {
			TiffCompression::None => 1,
			TiffCompression::Deflate => 8,
			TiffCompression::Jpeg => 7,
		}
	}

	/// Inverse of [`tag_value`](Self::tag_value). Also accepts the legacy Adobe deflate code 32946.
	pub fn from_tag_value(value: u16) -> Result<TiffCompression> {
		Ok(match value {
			1 => TiffCompression::None,
			8 | 32946 => TiffCompression::Deflate,
			7 => TiffCompression::Jpeg,
			_ => bail!("unsupported TIFF compression {value}"),
		})
	}

	pub fn parse_str(value: &str) -> Result<TiffCompression> {
		Ok(match value.to_lowercase().trim() {
			"none" | "raw" => TiffCompression::None,
			"deflate" | "zip" => TiffCompression::Deflate,
			"jpeg" | "jpg" => TiffCompression::Jpeg,
			_ => bail!("Unknown TIFF compression '{value}'. Expected none, deflate or jpeg"),
		})
	}

	/// JPEG blocks cannot carry an alpha channel.
	pub fn supports_alpha(&self) -> bool {
		!matches!(self, TiffCompression::Jpeg)
	}
}

impl Display for TiffCompression {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}
