//! Synthetic HiPS trees for tests.
//!
//! Only depends on the public API of the workspace crates, so integration tests can include it too.

use anyhow::Result;
use hips2cog_core::{HealpixAddress, HipsTileFormat};
use hips2cog_image::format;
use image::{DynamicImage, Rgb, RgbImage};
use std::{fs, path::Path};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// A distinct opaque color for each of the twelve base pixels.
pub fn palette(face: u64) -> Rgb<u8> {
	let i = (face % 12) as u8;
	Rgb([20 * i, 240 - 20 * i, 40 + 10 * i])
}

pub fn solid_tile(size: u32, color: Rgb<u8>) -> DynamicImage {
	DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, color))
}

/// A one-pixel checkerboard of `a` (on even `x + y`) and `b`.
pub fn checkerboard_tile(size: u32, a: Rgb<u8>, b: Rgb<u8>) -> DynamicImage {
	DynamicImage::ImageRgb8(RgbImage::from_fn(size, size, |x, y| if (x + y) % 2 == 0 { a } else { b }))
}

/// A solid tile whose color encodes the pixel index of `address`.
pub fn marker_color(address: &HealpixAddress) -> Rgb<u8> {
	let index = address.pixel_index;
	Rgb([(index & 0xff) as u8, ((index >> 8) & 0xff) as u8, 7])
}

pub fn write_tile(root: &Path, address: &HealpixAddress, tile_format: HipsTileFormat, image: &DynamicImage) -> Result<()> {
	let path = root.join(format!(
		"Norder{}/Dir{}/Npix{}.{}",
		address.order,
		address.dir_bucket(),
		address.pixel_index,
		tile_format.extension()
	));
	if let Some(parent) = path.parent() {
		fs::create_dir_all(parent)?;
	}
	fs::write(path, format::encode(image, tile_format, Some(95))?.as_slice())?;
	Ok(())
}

/// Writes every tile of `order` as PNG, colored by `color_of`.
pub fn write_order(root: &Path, order: u8, tile_size: u32, color_of: impl Fn(&HealpixAddress) -> Rgb<u8>) -> Result<()> {
	for address in HealpixAddress::iter_order(order)? {
		write_tile(root, &address, HipsTileFormat::Png, &solid_tile(tile_size, color_of(&address)))?;
	}
	Ok(())
}

/// Order 0 holds the twelve [`palette`] colors. Every order 1 tile is a checkerboard of its
/// parent's color and white.
pub fn write_sample_tree(root: &Path, tile_size: u32) -> Result<()> {
	write_order(root, 0, tile_size, |a| palette(a.pixel_index))?;
	for address in HealpixAddress::iter_order(1)? {
		let tile = checkerboard_tile(tile_size, palette(address.pixel_index >> 2), WHITE);
		write_tile(root, &address, HipsTileFormat::Png, &tile)?;
	}
	fs::write(
		root.join("properties"),
		format!("hips_order = 1\nhips_tile_width = {tile_size}\nhips_tile_format = png\n"),
	)?;
	Ok(())
}
