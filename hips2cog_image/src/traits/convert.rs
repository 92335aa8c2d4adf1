use anyhow::{Result, anyhow, bail};
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};

pub trait DynamicImageTraitConvert {
	fn from_fn_l8(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage;
	fn from_fn_rgb8(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> DynamicImage;
	fn from_fn_rgba8(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> DynamicImage;

	/// Wraps interleaved 8-bit samples; the channel count follows from the buffer length.
	fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<DynamicImage>;

	/// Iterates over the samples of each pixel. Only 8-bit images are supported.
	fn iter_pixels(&self) -> impl Iterator<Item = &[u8]>;
}

impl DynamicImageTraitConvert for DynamicImage {
	fn from_fn_l8(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
		DynamicImage::ImageLuma8(ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)])))
	}

	fn from_fn_rgb8(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> DynamicImage {
		DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| Rgb(f(x, y))))
	}

	fn from_fn_rgba8(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> DynamicImage {
		DynamicImage::ImageRgba8(ImageBuffer::from_fn(width, height, |x, y| Rgba(f(x, y))))
	}

	fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<DynamicImage> {
		let pixels = (width as usize) * (height as usize);
		if pixels == 0 || data.len() % pixels != 0 {
			bail!("{} bytes do not form a {width}x{height} image", data.len());
		}
		let channel_count = data.len() / pixels;
		let error = || anyhow!("Failed to create {channel_count}-channel image buffer with provided data");
		Ok(match channel_count {
			1 => DynamicImage::ImageLuma8(ImageBuffer::from_vec(width, height, data).ok_or_else(error)?),
			2 => DynamicImage::ImageLumaA8(ImageBuffer::from_vec(width, height, data).ok_or_else(error)?),
			3 => DynamicImage::ImageRgb8(ImageBuffer::from_vec(width, height, data).ok_or_else(error)?),
			4 => DynamicImage::ImageRgba8(ImageBuffer::from_vec(width, height, data).ok_or_else(error)?),
			_ => bail!("Unsupported channel count: {channel_count}"),
		})
	}

	fn iter_pixels(&self) -> impl Iterator<Item = &[u8]> {
		let channels = match self {
			DynamicImage::ImageLuma8(_) => 1,
			DynamicImage::ImageLumaA8(_) => 2,
			DynamicImage::ImageRgb8(_) => 3,
			DynamicImage::ImageRgba8(_) => 4,
			_ => panic!("Unsupported image type for pixel iteration: {:?}", self.color()),
		};
		self.as_bytes().chunks_exact(channels)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::GenericImageView;

	#[test]
	fn from_raw() -> Result<()> {
		let image = DynamicImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6])?;
		assert_eq!(image.color().channel_count(), 3);
		assert_eq!(image.get_pixel(1, 0).0, [4, 5, 6, 255]);

		let image = DynamicImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8])?;
		assert_eq!(image.color().channel_count(), 4);

		assert!(DynamicImage::from_raw(2, 2, vec![0; 5]).is_err());
		assert!(DynamicImage::from_raw(1, 1, vec![0; 5]).is_err());
		assert!(DynamicImage::from_raw(0, 1, vec![]).is_err());
		Ok(())
	}

	#[test]
	fn iter_pixels() {
		let image = DynamicImage::from_fn_rgb8(2, 2, |x, y| [x as u8, y as u8, 7]);
		let pixels: Vec<&[u8]> = image.iter_pixels().collect();
		let expected: Vec<&[u8]> = vec![&[0, 0, 7], &[1, 0, 7], &[0, 1, 7], &[1, 1, 7]];
		assert_eq!(pixels, expected);
	}
}
