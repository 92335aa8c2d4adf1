//! Pixel operations that build the pyramid.
//!
//! Every raster of a conversion shares one layout, chosen by the [`TileFill`]: RGBA for a
//! transparent placeholder, RGB for an opaque one. [`into_layout`](DynamicImageTraitOperation::into_layout)
//! brings decoded tiles into that layout, [`get_reduced`](DynamicImageTraitOperation::get_reduced)
//! halves a raster and [`get_region`](DynamicImageTraitOperation::get_region) cuts padded blocks.
//!
//! # Reduction
//!
//! Each output pixel summarizes a 2×2 input block. Sums are accumulated as integers and rounded
//! half-up only once:
//!
//! - RGB: `c = (Σc + 2) / 4`
//! - RGBA: colors are weighted by coverage, `c = (Σc·α + Σα/2) / Σα`, and `α = (Σα + 2) / 4`.
//!   A block without any coverage yields `(0, 0, 0, 0)`.
//!
//! Odd sizes round up; positions outside the input count as placeholder pixels.

use super::info::DynamicImageTraitInfo;
use crate::TileFill;
use anyhow::{Result, bail, ensure};
use image::{DynamicImage, GenericImage, Rgb, RgbImage, RgbaImage};
use imageproc::map::map_pixels;

const QUAD: [(u32, u32); 4] = [(0, 0), (1, 0), (0, 1), (1, 1)];

pub trait DynamicImageTraitOperation: DynamicImageTraitInfo {
	/// Converts any decoded tile into the 8-bit layout of `fill`.
	fn into_layout(self, fill: &TileFill) -> Result<DynamicImage>;

	/// Blends RGBA onto an opaque background, returning RGB. Non-alpha images pass through.
	fn into_flattened(self, color: Rgb<u8>) -> Result<DynamicImage>;

	/// Halves both dimensions (rounding up) with the coverage-weighted 2×2 mean.
	fn get_reduced(&self, fill: &TileFill) -> Result<DynamicImage>;

	/// Copies the `width × height` window at `(x, y)`; parts outside the image hold the placeholder.
	fn get_region(&self, x: u32, y: u32, width: u32, height: u32, fill: &TileFill) -> Result<DynamicImage>;

	/// Pastes `top` with its top-left corner at `(x, y)`. Both images must share a color type.
	fn paste(&mut self, top: &DynamicImage, x: u32, y: u32) -> Result<()>;
}

impl DynamicImageTraitOperation for DynamicImage {
	fn into_layout(self, fill: &TileFill) -> Result<DynamicImage> {
		match fill {
			TileFill::Transparent => Ok(match self {
				DynamicImage::ImageRgba8(_) => self,
				other => DynamicImage::ImageRgba8(other.into_rgba8()),
			}),
			TileFill::Color(color) => match self {
				DynamicImage::ImageRgb8(_) => Ok(self),
				other if !other.color().has_alpha() => Ok(DynamicImage::ImageRgb8(other.into_rgb8())),
				other => DynamicImage::ImageRgba8(other.into_rgba8()).into_flattened(*color),
			},
		}
	}

	fn into_flattened(self, color: Rgb<u8>) -> Result<DynamicImage> {
		if !self.color().has_alpha() {
			return Ok(self);
		}
		match self {
			DynamicImage::ImageRgba8(img) => {
				let c = [u16::from(color[0]), u16::from(color[1]), u16::from(color[2])];
				Ok(DynamicImage::from(map_pixels(&img, |p| {
					if p[3] == 255 {
						Rgb([p[0], p[1], p[2]])
					} else {
						let a = u16::from(p[3]);
						let b = u16::from(255 - p[3]);
						Rgb([
							((u16::from(p[0]) * a + c[0] * b + 127) / 255) as u8,
							((u16::from(p[1]) * a + c[1] * b + 127) / 255) as u8,
							((u16::from(p[2]) * a + c[2] * b + 127) / 255) as u8,
						])
					}
				})))
			}
			_ => bail!("Unsupported image type {:?} for flattening", self.color()),
		}
	}

	fn get_reduced(&self, fill: &TileFill) -> Result<DynamicImage> {
		let (width, height) = (self.width(), self.height());
		ensure!(width > 0 && height > 0, "cannot reduce an empty image");
		let (out_width, out_height) = (width.div_ceil(2), height.div_ceil(2));

		match (self, fill) {
			(DynamicImage::ImageRgb8(img), TileFill::Color(pad)) => {
				Ok(DynamicImage::ImageRgb8(RgbImage::from_fn(out_width, out_height, |x, y| {
					let mut sum = [2u32; 3];
					for (dx, dy) in QUAD {
						let (sx, sy) = (2 * x + dx, 2 * y + dy);
						let p = if sx < width && sy < height { img.get_pixel(sx, sy).0 } else { pad.0 };
						for c in 0..3 {
							sum[c] += u32::from(p[c]);
						}
					}
					Rgb(sum.map(|s| (s / 4) as u8))
				})))
			}
			(DynamicImage::ImageRgba8(img), TileFill::Transparent) => {
				Ok(DynamicImage::ImageRgba8(RgbaImage::from_fn(out_width, out_height, |x, y| {
					let mut weighted = [0u32; 3];
					let mut alpha = 0u32;
					for (dx, dy) in QUAD {
						let (sx, sy) = (2 * x + dx, 2 * y + dy);
						if sx >= width || sy >= height {
							continue;
						}
						let p = img.get_pixel(sx, sy).0;
						let a = u32::from(p[3]);
						alpha += a;
						for c in 0..3 {
							weighted[c] += u32::from(p[c]) * a;
						}
					}
					if alpha == 0 {
						return image::Rgba([0, 0, 0, 0]);
					}
					let color = weighted.map(|w| ((w + alpha / 2) / alpha) as u8);
					image::Rgba([color[0], color[1], color[2], ((alpha + 2) / 4) as u8])
				})))
			}
			_ => bail!(
				"cannot reduce a {:?} image with a {} placeholder",
				self.color(),
				fill
			),
		}
	}

	fn get_region(&self, x: u32, y: u32, width: u32, height: u32, fill: &TileFill) -> Result<DynamicImage> {
		if x + width <= self.width() && y + height <= self.height() {
			return Ok(self.crop_imm(x, y, width, height));
		}
		let mut region = fill.new_image(width, height);
		ensure!(
			region.color() == self.color(),
			"a {:?} image cannot be padded with a {} placeholder",
			self.color(),
			fill
		);
		if x < self.width() && y < self.height() {
			let inner_width = width.min(self.width() - x);
			let inner_height = height.min(self.height() - y);
			region.paste(&self.crop_imm(x, y, inner_width, inner_height), 0, 0)?;
		}
		Ok(region)
	}

	fn paste(&mut self, top: &DynamicImage, x: u32, y: u32) -> Result<()> {
		ensure!(
			self.color() == top.color(),
			"cannot paste a {:?} image into a {:?} image",
			top.color(),
			self.color()
		);
		self.copy_from(top, x, y)?;
		Ok(())
	}
}
