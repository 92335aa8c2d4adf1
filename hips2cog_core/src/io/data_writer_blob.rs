use super::DataWriterTrait;
use crate::{Blob, ByteRange};
use anyhow::Result;

/// Collects output in memory.
#[derive(Default)]
pub struct DataWriterBlob {
	data: Vec<u8>,
}

impl DataWriterBlob {
	pub fn new() -> DataWriterBlob {
		DataWriterBlob::default()
	}

	pub fn into_blob(self) -> Blob {
		Blob::from(self.data)
	}
}

impl DataWriterTrait for DataWriterBlob {
	fn append(&mut self, blob: &Blob) -> Result<ByteRange> {
		let range = ByteRange::new(self.data.len() as u64, blob.len());
		self.data.extend_from_slice(blob.as_slice());
		Ok(range)
	}

	fn get_position(&mut self) -> Result<u64> {
		Ok(self.data.len() as u64)
	}
}
