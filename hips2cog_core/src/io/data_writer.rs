//! The `DataWriterTrait`: sequential output with known offsets.

use crate::{Blob, ByteRange};
use anyhow::Result;
use std::io::Read;

const COPY_CHUNK: usize = 1 << 20;

pub trait DataWriterTrait: Send {
	/// Writes `blob` at the current position and returns where it landed.
	fn append(&mut self, blob: &Blob) -> Result<ByteRange>;

	fn get_position(&mut self) -> Result<u64>;

	/// Streams `reader` to the end of the output, chunk by chunk.
	fn append_reader(&mut self, reader: &mut dyn Read) -> Result<ByteRange> {
		let start = self.get_position()?;
		let mut buffer = vec![0u8; COPY_CHUNK];
		loop {
			let n = reader.read(&mut buffer)?;
			if n == 0 {
				break;
			}
			self.append(&Blob::from(&buffer[..n]))?;
		}
		Ok(ByteRange::new(start, self.get_position()? - start))
	}
}
