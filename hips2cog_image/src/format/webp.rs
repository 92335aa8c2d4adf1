//! WebP tiles. Decoding handles lossy and lossless files, encoding is lossless only.

use anyhow::{Result, anyhow, bail};
use hips2cog_core::Blob;
use image::{DynamicImage, ImageEncoder, ImageFormat, codecs::webp::WebPEncoder, load_from_memory_with_format};

use crate::traits::DynamicImageTraitInfo;

pub fn encode(image: &DynamicImage) -> Result<Blob> {
	if image.bits_per_value() != 8 || !matches!(image.channel_count(), 3 | 4) {
		bail!("WebP encoding only supports 8-bit RGB or RGBA images");
	}

	let mut buffer: Vec<u8> = Vec::new();
	WebPEncoder::new_lossless(&mut buffer).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.extended_color_type(),
	)?;
	Ok(Blob::from(buffer))
}

pub fn blob2image(blob: &Blob) -> Result<DynamicImage> {
	load_from_memory_with_format(blob.as_slice(), ImageFormat::WebP)
		.map_err(|e| anyhow!("Failed to decode WebP image: {e}"))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::traits::DynamicImageTraitTest;

	#[test]
	fn lossless_round_trip() -> Result<()> {
		let img = DynamicImage::new_test_rgba();
		let decoded = blob2image(&encode(&img)?)?;
		assert_eq!(img.diff(&decoded)?, vec![0.0; 4]);
		Ok(())
	}

	#[test]
	fn rejects_grey() {
		assert!(encode(&DynamicImage::new_test_grey()).is_err());
	}
}
