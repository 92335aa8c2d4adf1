//! The placeholder that stands in for missing tiles and for pixels outside a raster.
//!
//! The fill also fixes the pixel layout of the whole pyramid: a transparent fill produces RGBA
//! levels, an opaque color produces RGB levels.
//!
//! ```
//! use hips2cog_image::TileFill;
//!
//! assert_eq!(TileFill::parse_str("transparent").unwrap(), TileFill::Transparent);
//! assert_eq!(TileFill::parse_str("black").unwrap().pixel(), vec![0, 0, 0]);
//! assert_eq!(TileFill::parse_str("#102030").unwrap().channel_count(), 3);
//! ```

use crate::color::parse_hex_color;
use anyhow::{Result, bail};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TileFill {
	#[default]
	Transparent,
	Color(Rgb<u8>),
}

impl TileFill {
	pub fn black() -> TileFill {
		TileFill::Color(Rgb([0, 0, 0]))
	}

	/// `transparent`, `black`, `white` or a hex color (`#RRGGBB`, `#RGB`).
	pub fn parse_str(value: &str) -> Result<TileFill> {
		Ok(match value.trim().to_lowercase().as_str() {
			"transparent" | "none" => TileFill::Transparent,
			"black" => TileFill::black(),
			"white" => TileFill::Color(Rgb([255, 255, 255])),
			other => match parse_hex_color(other)?.as_slice() {
				[r, g, b] => TileFill::Color(Rgb([*r, *g, *b])),
				_ => bail!("fill color '{value}' must be opaque (#RRGGBB)"),
			},
		})
	}

	pub fn has_alpha(&self) -> bool {
		matches!(self, TileFill::Transparent)
	}

	/// Channels of every raster filled with this placeholder: 4 (RGBA) or 3 (RGB).
	pub fn channel_count(&self) -> u8 {
		if self.has_alpha() { 4 } else { 3 }
	}

	/// The placeholder pixel in the fill's layout.
	pub fn pixel(&self) -> Vec<u8> {
		match self {
			TileFill::Transparent => vec![0, 0, 0, 0],
			TileFill::Color(c) => c.0.to_vec(),
		}
	}

	/// A `width × height` raster holding only the placeholder.
	pub fn new_image(&self, width: u32, height: u32) -> DynamicImage {
		match self {
			TileFill::Transparent => DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]))),
			TileFill::Color(c) => DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, *c)),
		}
	}
}

impl FromStr for TileFill {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self> {
		TileFill::parse_str(s)
	}
}

impl fmt::Display for TileFill {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TileFill::Transparent => f.write_str("transparent"),
			TileFill::Color(Rgb([r, g, b])) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::GenericImageView;
	use rstest::rstest;

	#[rstest]
	#[case("transparent", TileFill::Transparent)]
	#[case("Black", TileFill::Color(Rgb([0, 0, 0])))]
	#[case("white", TileFill::Color(Rgb([255, 255, 255])))]
	#[case("#ff8000", TileFill::Color(Rgb([255, 128, 0])))]
	#[case("0f0", TileFill::Color(Rgb([0, 255, 0])))]
	fn parse(#[case] input: &str, #[case] expected: TileFill) {
		assert_eq!(input.parse::<TileFill>().unwrap(), expected);
	}

	#[test]
	fn parse_rejects_translucent_and_garbage() {
		assert!(TileFill::parse_str("#ff000080").is_err());
		assert!(TileFill::parse_str("grey-ish").is_err());
	}

	#[test]
	fn display_round_trips() {
		for fill in [TileFill::Transparent, TileFill::Color(Rgb([1, 2, 254]))] {
			assert_eq!(fill.to_string().parse::<TileFill>().unwrap(), fill);
		}
	}

	#[test]
	fn new_image() {
		let image = TileFill::Transparent.new_image(3, 2);
		assert_eq!(image.dimensions(), (3, 2));
		assert_eq!(image.get_pixel(2, 1).0, [0, 0, 0, 0]);

		let image = TileFill::black().new_image(2, 2);
		assert_eq!(image.color().channel_count(), 3);
		assert_eq!(image.as_bytes(), &[0; 12]);
	}
}
