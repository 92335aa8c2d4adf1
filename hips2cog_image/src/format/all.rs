use super::{jpeg, png, webp};
use anyhow::Result;
use hips2cog_core::{Blob, HipsTileFormat};
use image::DynamicImage;

pub fn encode(image: &DynamicImage, format: HipsTileFormat, quality: Option<u8>) -> Result<Blob> {
	match format {
		HipsTileFormat::Jpeg => jpeg::encode(image, quality),
		HipsTileFormat::Png => png::encode(image),
		HipsTileFormat::Webp => webp::encode(image),
	}
}

pub fn decode(blob: &Blob, format: HipsTileFormat) -> Result<DynamicImage> {
	match format {
		HipsTileFormat::Jpeg => jpeg::blob2image(blob),
		HipsTileFormat::Png => png::blob2image(blob),
		HipsTileFormat::Webp => webp::blob2image(blob),
	}
}
