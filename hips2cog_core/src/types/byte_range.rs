//! Offset/length pairs describing a contiguous span of bytes in a file or buffer.

use std::fmt;
use std::ops::Range;

/// A contiguous span of bytes: `offset..offset + length`.
#[derive(Clone, Copy, Eq, Hash, PartialEq, Default)]
pub struct ByteRange {
	pub offset: u64,
	pub length: u64,
}

impl ByteRange {
	pub fn new(offset: u64, length: u64) -> Self {
		Self { offset, length }
	}

	pub fn empty() -> Self {
		Self { offset: 0, length: 0 }
	}

	/// First byte after the range, saturating at `u64::MAX` for ranges read from untrusted input.
	pub fn end(&self) -> u64 {
		self.offset.saturating_add(self.length)
	}

	pub fn as_range_usize(&self) -> Range<usize> {
		Range {
			start: self.offset as usize,
			end: self.end() as usize,
		}
	}
}

impl fmt::Debug for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ByteRange[{},{}]", self.offset, self.length)
	}
}

impl fmt::Display for ByteRange {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}..{}", self.offset, self.end())
	}
}
