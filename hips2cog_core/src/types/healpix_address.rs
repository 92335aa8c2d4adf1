//! Nested HEALPix addresses and their placement in the HiPS all-sky grid.
//!
//! At order `k` the sphere is divided into `12·4^k` pixels (`nside = 2^k`). HiPS lays the twelve
//! base pixels out as a 4×3 grid of faces, each face holding `nside × nside` tiles:
//!
//! ```text
//! order 0            order 1
//! +--+--+--+--+      +--+--+--+--+--+--+--+--+
//! | 0| 1| 2| 3|      | 0| 2| 4| 6| 8|10|12|14|
//! +--+--+--+--+      +--+--+--+--+--+--+--+--+
//! | 4| 5| 6| 7|      | 1| 3| 5| 7| 9|11|13|15|
//! +--+--+--+--+      +--+--+--+--+--+--+--+--+
//! | 8| 9|10|11|      |16|18|20|22|24|26|28|30|
//! +--+--+--+--+      +--+--+--+--+--+--+--+--+
//!                    ...
//! ```
//!
//! Inside a face the nested index interleaves the row (even bits) and the column (odd bits), so
//! the grid is the transpose of the usual Z-order curve.
//!
//! # Examples
//!
//! ```
//! use hips2cog_core::{GridPosition, HealpixAddress};
//!
//! let address = HealpixAddress::new(1, 3).unwrap();
//! assert_eq!(address.grid_position(), GridPosition { col: 1, row: 1 });
//! assert_eq!(address.parent().unwrap(), HealpixAddress::new(0, 0).unwrap());
//! ```

use super::HipsError;
use std::fmt;

/// Highest order whose pixel indices fit into 64 bits.
pub const MAX_ORDER: u8 = 29;

/// Position of a tile in the all-sky grid of one order, in tile units.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct GridPosition {
	pub col: u32,
	pub row: u32,
}

/// One tile of the nested HEALPix quad-tree.
#[derive(Clone, Copy, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HealpixAddress {
	pub order: u8,
	pub pixel_index: u64,
}

impl HealpixAddress {
	/// Creates an address, checking `pixel_index < 12·4^order`.
	pub fn new(order: u8, pixel_index: u64) -> Result<HealpixAddress, HipsError> {
		if order > MAX_ORDER || pixel_index >= Self::pixel_count(order) {
			return Err(HipsError::AddressOutOfRange {
				order: i64::from(order),
				pixel_index: i64::try_from(pixel_index).unwrap_or(i64::MAX),
			});
		}
		Ok(HealpixAddress { order, pixel_index })
	}

	/// Number of valid pixel indices at `order`: `12·4^order`.
	pub fn pixel_count(order: u8) -> u64 {
		12u64 << (2 * u32::from(order.min(MAX_ORDER)))
	}

	/// Tiles along one edge of a base face: `2^order`.
	pub fn nside(order: u8) -> u64 {
		1u64 << order.min(MAX_ORDER)
	}

	/// Size of the all-sky grid at `order` as `(columns, rows)` in tiles.
	pub fn grid_size(order: u8) -> (u32, u32) {
		let nside = Self::nside(order) as u32;
		(4 * nside, 3 * nside)
	}

	/// Enumerates every address of `order` in pixel-index order.
	pub fn iter_order(order: u8) -> Result<impl Iterator<Item = HealpixAddress>, HipsError> {
		if order > MAX_ORDER {
			return Err(HipsError::AddressOutOfRange {
				order: i64::from(order),
				pixel_index: 0,
			});
		}
		Ok((0..Self::pixel_count(order)).map(move |pixel_index| HealpixAddress { order, pixel_index }))
	}

	/// Column and row of this tile in the all-sky grid of its order.
	pub fn grid_position(&self) -> GridPosition {
		let nside = Self::nside(self.order);
		let face = self.pixel_index / (nside * nside);
		let in_face = self.pixel_index % (nside * nside);
		let row_in_face = compact_bits(in_face);
		let col_in_face = compact_bits(in_face >> 1);
		GridPosition {
			col: ((face % 4) * nside + col_in_face) as u32,
			row: ((face / 4) * nside + row_in_face) as u32,
		}
	}

	/// Inverse of [`grid_position`](Self::grid_position).
	pub fn from_grid_position(order: u8, position: GridPosition) -> Result<HealpixAddress, HipsError> {
		let (cols, rows) = Self::grid_size(order);
		if order > MAX_ORDER || position.col >= cols || position.row >= rows {
			return Err(HipsError::AddressOutOfRange {
				order: i64::from(order),
				pixel_index: -1,
			});
		}
		let nside = Self::nside(order);
		let (col, row) = (u64::from(position.col), u64::from(position.row));
		let face = (row / nside) * 4 + col / nside;
		let in_face = (spread_bits(col % nside) << 1) | spread_bits(row % nside);
		Self::new(order, face * nside * nside + in_face)
	}

	/// The address one order up that contains this tile, `None` at order 0.
	pub fn parent(&self) -> Option<HealpixAddress> {
		(self.order > 0).then(|| HealpixAddress {
			order: self.order - 1,
			pixel_index: self.pixel_index >> 2,
		})
	}

	/// The four addresses one order down that partition this tile.
	pub fn children(&self) -> Result<[HealpixAddress; 4], HipsError> {
		let order = self.order + 1;
		let first = self.pixel_index << 2;
		Ok([
			Self::new(order, first)?,
			Self::new(order, first + 1)?,
			Self::new(order, first + 2)?,
			Self::new(order, first + 3)?,
		])
	}

	/// HiPS directory bucket: `floor(pixel_index / 10000) * 10000`.
	pub fn dir_bucket(&self) -> u64 {
		(self.pixel_index / 10_000) * 10_000
	}
}

impl TryFrom<(i64, i64)> for HealpixAddress {
	type Error = HipsError;

	/// Validates signed inputs such as command line values, rejecting negatives.
	fn try_from((order, pixel_index): (i64, i64)) -> Result<Self, Self::Error> {
		let error = HipsError::AddressOutOfRange { order, pixel_index };
		let order = u8::try_from(order).map_err(|_| HipsError::AddressOutOfRange { order, pixel_index })?;
		let pixel_index = u64::try_from(pixel_index).map_err(|_| error)?;
		HealpixAddress::new(order, pixel_index)
	}
}

impl fmt::Debug for HealpixAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "HealpixAddress(order {}, pixel {})", self.order, self.pixel_index)
	}
}

impl fmt::Display for HealpixAddress {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.order, self.pixel_index)
	}
}

/// Gathers the even bits of `v` into the low half (Morton decode of one axis).
fn compact_bits(v: u64) -> u64 {
	let mut r = v & 0x5555_5555_5555_5555;
	r = (r ^ (r >> 1)) & 0x3333_3333_3333_3333;
	r = (r ^ (r >> 2)) & 0x0f0f_0f0f_0f0f_0f0f;
	r = (r ^ (r >> 4)) & 0x00ff_00ff_00ff_00ff;
	r = (r ^ (r >> 8)) & 0x0000_ffff_0000_ffff;
	(r ^ (r >> 16)) & 0x0000_0000_ffff_ffff
}

/// Spreads the low 32 bits of `v` onto the even bit positions (Morton encode of one axis).
fn spread_bits(v: u64) -> u64 {
	let mut r = v & 0xffff_ffff;
	r = (r ^ (r << 16)) & 0x0000_ffff_0000_ffff;
	r = (r ^ (r << 8)) & 0x00ff_00ff_00ff_00ff;
	r = (r ^ (r << 4)) & 0x0f0f_0f0f_0f0f_0f0f;
	r = (r ^ (r << 2)) & 0x3333_3333_3333_3333;
	(r ^ (r << 1)) & 0x5555_5555_5555_5555
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::collections::HashSet;

	#[rstest]
	#[case(0, 12)]
	#[case(1, 48)]
	#[case(2, 192)]
	#[case(3, 768)]
	#[case(10, 12_582_912)]
	fn pixel_count(#[case] order: u8, #[case] count: u64) {
		assert_eq!(HealpixAddress::pixel_count(order), count);
		if order <= 3 {
			assert_eq!(HealpixAddress::iter_order(order).unwrap().count() as u64, count);
		}
	}

	#[rstest]
	#[case(0)]
	#[case(1)]
	#[case(4)]
	#[case(MAX_ORDER)]
	fn bounds(#[case] order: u8) {
		let count = HealpixAddress::pixel_count(order);
		assert!(HealpixAddress::new(order, count - 1).is_ok());
		assert!(matches!(
			HealpixAddress::new(order, count),
			Err(HipsError::AddressOutOfRange { .. })
		));
	}

	#[test]
	fn negative_and_oversized_inputs() {
		assert!(matches!(
			HealpixAddress::try_from((2, -1)),
			Err(HipsError::AddressOutOfRange {
				order: 2,
				pixel_index: -1
			})
		));
		assert!(matches!(
			HealpixAddress::try_from((-1, 0)),
			Err(HipsError::AddressOutOfRange { .. })
		));
		assert!(matches!(
			HealpixAddress::try_from((30, 0)),
			Err(HipsError::AddressOutOfRange { .. })
		));
		assert!(HealpixAddress::iter_order(30).is_err());
		assert_eq!(HealpixAddress::try_from((1, 47)).unwrap(), HealpixAddress::new(1, 47).unwrap());
	}

	#[test]
	fn grid_matches_hips_layout() {
		// order 1, first two rows of the all-sky grid
		let expected = [[0, 2, 4, 6, 8, 10, 12, 14], [1, 3, 5, 7, 9, 11, 13, 15]];
		for (row, line) in expected.iter().enumerate() {
			for (col, pixel_index) in line.iter().enumerate() {
				let address = HealpixAddress::new(1, *pixel_index).unwrap();
				assert_eq!(
					address.grid_position(),
					GridPosition {
						col: col as u32,
						row: row as u32
					}
				);
			}
		}

		// order 2, top-left face
		let expected = [[0, 2, 8, 10], [1, 3, 9, 11], [4, 6, 12, 14], [5, 7, 13, 15]];
		for (row, line) in expected.iter().enumerate() {
			for (col, pixel_index) in line.iter().enumerate() {
				let position = GridPosition {
					col: col as u32,
					row: row as u32,
				};
				assert_eq!(HealpixAddress::from_grid_position(2, position).unwrap().pixel_index, *pixel_index);
			}
		}

		// order 0 faces are laid out row-major
		for pixel_index in 0..12 {
			let position = HealpixAddress::new(0, pixel_index).unwrap().grid_position();
			assert_eq!(u64::from(position.row * 4 + position.col), pixel_index);
		}
	}

	#[rstest]
	#[case(0)]
	#[case(1)]
	#[case(3)]
	fn grid_is_a_bijection(#[case] order: u8) {
		let (cols, rows) = HealpixAddress::grid_size(order);
		let mut seen = HashSet::new();
		for address in HealpixAddress::iter_order(order).unwrap() {
			let position = address.grid_position();
			assert!(position.col < cols && position.row < rows);
			assert!(seen.insert(position), "{address:?} collides");
			assert_eq!(HealpixAddress::from_grid_position(order, position).unwrap(), address);
		}
		assert_eq!(seen.len() as u64, u64::from(cols) * u64::from(rows));
	}

	#[test]
	fn children_occupy_the_parent_quadrants() {
		for parent in HealpixAddress::iter_order(2).unwrap() {
			let p = parent.grid_position();
			let mut quadrants = HashSet::new();
			for child in parent.children().unwrap() {
				assert_eq!(child.parent(), Some(parent));
				let c = child.grid_position();
				assert_eq!((c.col / 2, c.row / 2), (p.col, p.row));
				quadrants.insert((c.col % 2, c.row % 2));
			}
			assert_eq!(quadrants.len(), 4);
		}
		assert_eq!(HealpixAddress::new(0, 5).unwrap().parent(), None);
		assert!(HealpixAddress::new(MAX_ORDER, 0).unwrap().children().is_err());
	}

	#[test]
	fn dir_bucket() {
		assert_eq!(HealpixAddress::new(5, 9_999).unwrap().dir_bucket(), 0);
		assert_eq!(HealpixAddress::new(5, 10_000).unwrap().dir_bucket(), 10_000);
		assert_eq!(HealpixAddress::new(5, 12_287).unwrap().dir_bucket(), 10_000);
		assert_eq!(HealpixAddress::new(7, 123_456).unwrap().dir_bucket(), 120_000);
	}

	#[test]
	fn formatting() {
		let address = HealpixAddress::new(3, 17).unwrap();
		assert_eq!(format!("{address}"), "3/17");
		assert_eq!(format!("{address:?}"), "HealpixAddress(order 3, pixel 17)");
	}
}
