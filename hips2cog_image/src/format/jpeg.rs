//! JPEG for HiPS tiles and for TIFF blocks with compression 7.
//!
//! Only 8-bit grey and RGB images can be encoded, JPEG has no alpha channel. The encoder writes
//! full-resolution chroma, which matches `YCbCrSubsampling = 1×1` in the TIFF directory.
//!
//! [`read_frame`] inspects a stream without decoding it, to tell whether a source tile can be
//! stored in a TIFF block byte for byte.

use crate::traits::DynamicImageTraitInfo;
use anyhow::{Result, anyhow, bail, ensure};
use hips2cog_core::Blob;
use image::{DynamicImage, ImageEncoder, ImageFormat, codecs::jpeg::JpegEncoder, load_from_memory_with_format};

/// Encodes `image` with `quality` in `1..=99`, defaulting to 90.
pub fn encode(image: &DynamicImage, quality: Option<u8>) -> Result<Blob> {
	if image.bits_per_value() != 8 {
		bail!("JPEG only supports 8-bit images");
	}

	let quality = quality.unwrap_or(90);
	if quality == 0 || quality >= 100 {
		bail!("JPEG quality must be between 1 and 99, got {quality}");
	}

	if !matches!(image.channel_count(), 1 | 3) {
		bail!("JPEG only supports Grey or RGB images without alpha channel");
	}

	let mut buffer: Vec<u8> = Vec::new();
	JpegEncoder::new_with_quality(&mut buffer, quality).write_image(
		image.as_bytes(),
		image.width(),
		image.height(),
		image.extended_color_type(),
	)?;

	Ok(Blob::from(buffer))
}

pub fn blob2image(blob: &Blob) -> Result<DynamicImage> {
	load_from_memory_with_format(blob.as_slice(), ImageFormat::Jpeg)
		.map_err(|e| anyhow!("Failed to decode JPEG image: {e}"))
}

/// Frame header (SOF segment) of a JPEG stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JpegFrame {
	pub width: u32,
	pub height: u32,
	/// Bits per sample.
	pub precision: u8,
	/// `(horizontal, vertical)` sampling factors, one pair per component.
	pub sampling: Vec<(u8, u8)>,
	/// Baseline or extended sequential Huffman coding, as opposed to progressive or arithmetic.
	pub sequential: bool,
}

impl JpegFrame {
	/// The `YCbCrSubsampling` a TIFF directory must declare to hold this stream unchanged, or
	/// `None` when the stream is not an 8-bit sequential YCbCr frame TIFF readers accept.
	pub fn tiff_subsampling(&self) -> Option<[u16; 2]> {
		if !self.sequential || self.precision != 8 {
			return None;
		}
		match self.sampling.as_slice() {
			[(h, v), (1, 1), (1, 1)] if matches!((h, v), (1, 1) | (2, 1) | (2, 2)) => {
				Some([u16::from(*h), u16::from(*v)])
			}
			_ => None,
		}
	}
}

/// Reads the frame header of `blob` by walking the marker segments up to the first SOF.
pub fn read_frame(blob: &Blob) -> Result<JpegFrame> {
	let data = blob.as_slice();
	ensure!(data.starts_with(&[0xFF, 0xD8]), "JPEG stream lacks the start of image marker");

	let mut pos = 2;
	while pos + 4 <= data.len() {
		ensure!(data[pos] == 0xFF, "expected a JPEG marker at byte {pos}");
		let marker = data[pos + 1];
		if marker == 0xFF {
			// fill byte
			pos += 1;
			continue;
		}
		let length = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
		ensure!(length >= 2, "invalid JPEG segment length at byte {pos}");
		let segment = data
			.get(pos + 4..pos + 2 + length)
			.ok_or_else(|| anyhow!("truncated JPEG segment at byte {pos}"))?;
		match marker {
			// SOF0..SOF15 without DHT, JPG and DAC
			0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => return parse_frame(marker, segment),
			0xDA => break,
			_ => pos += 2 + length,
		}
	}
	bail!("JPEG stream has no frame header")
}

fn parse_frame(marker: u8, segment: &[u8]) -> Result<JpegFrame> {
	ensure!(segment.len() >= 6, "JPEG frame header is too short");
	let components = usize::from(segment[5]);
	ensure!(
		segment.len() >= 6 + 3 * components,
		"JPEG frame header lists {components} components but is only {} bytes long",
		segment.len()
	);
	Ok(JpegFrame {
		precision: segment[0],
		height: u32::from(u16::from_be_bytes([segment[1], segment[2]])),
		width: u32::from(u16::from_be_bytes([segment[3], segment[4]])),
		sampling: segment[6..6 + 3 * components]
			.chunks_exact(3)
			.map(|c| (c[1] >> 4, c[1] & 0x0F))
			.collect(),
		sequential: matches!(marker, 0xC0 | 0xC1),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::traits::DynamicImageTraitTest;
	use rstest::rstest;

	#[rstest]
	#[case::grey(DynamicImage::new_test_grey())]
	#[case::rgb(DynamicImage::new_test_rgb())]
	fn jpeg_ok(#[case] img: DynamicImage) -> Result<()> {
		let blob = encode(&img, Some(95))?;
		let decoded = blob2image(&blob)?;
		assert!(img.diff(&decoded)?.iter().all(|d| *d < 5.0));
		assert!(blob.len() < img.as_bytes().len() as u64);
		Ok(())
	}

	#[test]
	fn jpeg_rejects_alpha_images() {
		assert_eq!(
			encode(&DynamicImage::new_test_rgba(), None).unwrap_err().to_string(),
			"JPEG only supports Grey or RGB images without alpha channel"
		);
	}

	#[rstest]
	#[case(0)]
	#[case(100)]
	fn jpeg_rejects_quality(#[case] quality: u8) {
		assert!(encode(&DynamicImage::new_test_rgb(), Some(quality)).is_err());
	}

	#[test]
	fn garbage_fails_to_decode() {
		assert!(blob2image(&Blob::from("not a jpeg")).is_err());
	}

	/// Start of image, then a frame header with the given marker, size and luma sampling.
	fn frame_only(marker: u8, width: u16, height: u16, luma: u8) -> Blob {
		let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46];
		data.extend_from_slice(&[0xFF, marker, 0x00, 0x11, 8]);
		data.extend_from_slice(&height.to_be_bytes());
		data.extend_from_slice(&width.to_be_bytes());
		data.extend_from_slice(&[3, 1, luma, 0, 2, 0x11, 1, 3, 0x11, 1]);
		Blob::from(data)
	}

	#[test]
	fn frame_of_encoded_image() -> Result<()> {
		let frame = read_frame(&encode(&DynamicImage::new_test_rgb(), None)?)?;
		assert_eq!((frame.width, frame.height), (256, 256));
		assert_eq!(frame.sampling, vec![(1, 1); 3]);
		assert_eq!(frame.tiff_subsampling(), Some([1, 1]));

		let grey = read_frame(&encode(&DynamicImage::new_test_grey(), None)?)?;
		assert_eq!(grey.sampling.len(), 1);
		assert_eq!(grey.tiff_subsampling(), None);
		Ok(())
	}

	#[rstest]
	#[case(0xC0, 0x22, Some([2, 2]))]
	#[case(0xC1, 0x21, Some([2, 1]))]
	#[case(0xC0, 0x12, None)]
	#[case(0xC2, 0x22, None)]
	fn frame_headers(#[case] marker: u8, #[case] luma: u8, #[case] expected: Option<[u16; 2]>) -> Result<()> {
		let frame = read_frame(&frame_only(marker, 512, 384, luma))?;
		assert_eq!((frame.width, frame.height, frame.precision), (512, 384, 8));
		assert_eq!(frame.tiff_subsampling(), expected);
		Ok(())
	}

	#[rstest]
	#[case(b"not a jpeg".to_vec())]
	#[case(vec![0xFF, 0xD8])]
	#[case(vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x11, 8, 0])]
	#[case(vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02, 0, 0])]
	fn frame_errors(#[case] data: Vec<u8>) {
		assert!(read_frame(&Blob::from(data)).is_err());
	}
}
