//! Where a tile lives below a HiPS root.

use hips2cog_core::{HealpixAddress, HipsError, HipsTileFormat};

/// Maps addresses onto the `NorderK/DirD/NpixP.ext` naming of a HiPS tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HipsLocator {
	format: HipsTileFormat,
}

impl HipsLocator {
	pub fn new(format: HipsTileFormat) -> HipsLocator {
		HipsLocator { format }
	}

	pub fn format(&self) -> HipsTileFormat {
		self.format
	}

	/// Path of an already validated address, relative to the root.
	pub fn tile_location(&self, address: &HealpixAddress) -> String {
		format!(
			"Norder{}/Dir{}/Npix{}.{}",
			address.order,
			address.dir_bucket(),
			address.pixel_index,
			self.format.extension()
		)
	}

	/// Validates `(order, pixel_index)` and returns its path.
	pub fn locate(&self, order: i64, pixel_index: i64) -> Result<String, HipsError> {
		Ok(self.tile_location(&HealpixAddress::try_from((order, pixel_index))?))
	}

	/// All addresses of `order`, in pixel-index order.
	pub fn addresses(order: u8) -> Result<impl Iterator<Item = HealpixAddress>, HipsError> {
		HealpixAddress::iter_order(order)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case(HipsTileFormat::Jpeg, 0, 0, "Norder0/Dir0/Npix0.jpg")]
	#[case(HipsTileFormat::Png, 3, 767, "Norder3/Dir0/Npix767.png")]
	#[case(HipsTileFormat::Jpeg, 5, 9_999, "Norder5/Dir0/Npix9999.jpg")]
	#[case(HipsTileFormat::Jpeg, 5, 10_000, "Norder5/Dir10000/Npix10000.jpg")]
	#[case(HipsTileFormat::Webp, 7, 123_456, "Norder7/Dir120000/Npix123456.webp")]
	fn locations(#[case] format: HipsTileFormat, #[case] order: i64, #[case] pixel: i64, #[case] expected: &str) {
		assert_eq!(HipsLocator::new(format).locate(order, pixel).unwrap(), expected);
	}

	#[rstest]
	#[case(0, 12)]
	#[case(1, 48)]
	#[case(2, -1)]
	#[case(-1, 0)]
	fn out_of_range(#[case] order: i64, #[case] pixel: i64) {
		let error = HipsLocator::new(HipsTileFormat::Jpeg).locate(order, pixel).unwrap_err();
		assert!(matches!(error, HipsError::AddressOutOfRange { .. }));
	}

	#[test]
	fn enumerates_every_index_once() {
		let indices: Vec<u64> = HipsLocator::addresses(2).unwrap().map(|a| a.pixel_index).collect();
		assert_eq!(indices, (0..192).collect::<Vec<u64>>());
		assert!(HipsLocator::addresses(30).is_err());
	}
}
