//! Channel layout and comparison helpers for `DynamicImage`.

use super::convert::DynamicImageTraitConvert;
use anyhow::{Result, ensure};
use image::{DynamicImage, ExtendedColorType};

pub trait DynamicImageTraitInfo: DynamicImageTraitConvert {
	/// Bits per single channel value, e.g. `8` for `Rgb8`.
	fn bits_per_value(&self) -> u8;

	fn channel_count(&self) -> u8;

	/// Per-channel difference score `ceil(10 · SSE / N) / 10` against `other`.
	fn diff(&self, other: &DynamicImage) -> Result<Vec<f64>>;

	/// Largest absolute difference of any sample against `other`.
	fn max_abs_diff(&self, other: &DynamicImage) -> Result<u8>;

	fn ensure_same_meta(&self, other: &DynamicImage) -> Result<()>;

	fn ensure_same_size(&self, other: &DynamicImage) -> Result<()>;

	fn extended_color_type(&self) -> ExtendedColorType;
}

impl DynamicImageTraitInfo for DynamicImage
where
	DynamicImage: DynamicImageTraitConvert,
{
	fn bits_per_value(&self) -> u8 {
		(self.color().bits_per_pixel() / u16::from(self.color().channel_count())) as u8
	}

	fn channel_count(&self) -> u8 {
		self.color().channel_count()
	}

	fn diff(&self, other: &DynamicImage) -> Result<Vec<f64>> {
		self.ensure_same_meta(other)?;

		let channels = self.color().channel_count() as usize;
		let mut sqr_sum = vec![0u64; channels];

		for (p1, p2) in self.iter_pixels().zip(other.iter_pixels()) {
			for i in 0..channels {
				let d = i64::from(p1[i]) - i64::from(p2[i]);
				sqr_sum[i] += (d * d) as u64;
			}
		}

		let n = f64::from(self.width() * self.height());
		Ok(sqr_sum.iter().map(|v| (10.0 * (*v as f64) / n).ceil() / 10.0).collect())
	}

	fn max_abs_diff(&self, other: &DynamicImage) -> Result<u8> {
		self.ensure_same_meta(other)?;
		Ok(self
			.as_bytes()
			.iter()
			.zip(other.as_bytes())
			.map(|(a, b)| a.abs_diff(*b))
			.max()
			.unwrap_or(0))
	}

	fn ensure_same_meta(&self, other: &DynamicImage) -> Result<()> {
		self.ensure_same_size(other)?;
		ensure!(
			self.color() == other.color(),
			"Pixel value type mismatch: self has {:?}, but the other image has {:?}",
			self.color(),
			other.color()
		);
		Ok(())
	}

	fn ensure_same_size(&self, other: &DynamicImage) -> Result<()> {
		ensure!(
			self.width() == other.width() && self.height() == other.height(),
			"Image size mismatch: self is {}x{}, but the other image is {}x{}",
			self.width(),
			self.height(),
			other.width(),
			other.height()
		);
		Ok(())
	}

	fn extended_color_type(&self) -> ExtendedColorType {
		self.color().into()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(DynamicImage::from_fn_l8(2, 2, |_, _| 0), 8, 1)]
	#[case(DynamicImage::from_fn_rgb8(2, 2, |_, _| [0; 3]), 8, 3)]
	#[case(DynamicImage::from_fn_rgba8(2, 2, |_, _| [0; 4]), 8, 4)]
	#[case(DynamicImage::new_rgb16(2, 2), 16, 3)]
	fn bits_and_channels(#[case] img: DynamicImage, #[case] bits: u8, #[case] channels: u8) {
		assert_eq!(img.bits_per_value(), bits);
		assert_eq!(img.channel_count(), channels);
	}

	#[test]
	fn diffs() -> Result<()> {
		let a = DynamicImage::from_fn_rgb8(2, 2, |_, _| [10, 20, 30]);
		let b = DynamicImage::from_fn_rgb8(2, 2, |x, _| [10, 20 + x as u8 * 2, 27]);
		assert_eq!(a.diff(&a)?, vec![0.0, 0.0, 0.0]);
		assert_eq!(a.diff(&b)?, vec![0.0, 2.0, 9.0]);
		assert_eq!(a.max_abs_diff(&b)?, 3);

		let c = DynamicImage::from_fn_rgb8(3, 2, |_, _| [0; 3]);
		assert!(a.diff(&c).is_err());
		let d = DynamicImage::from_fn_rgba8(2, 2, |_, _| [0; 4]);
		assert!(a.max_abs_diff(&d).is_err());
		Ok(())
	}
}
