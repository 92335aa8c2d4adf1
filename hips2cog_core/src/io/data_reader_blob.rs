use super::DataReaderTrait;
use crate::{Blob, ByteRange};
use anyhow::Result;
use async_trait::async_trait;

/// Serves ranges of an in-memory blob, used for COGs assembled with `DataWriterBlob`.
#[derive(Debug)]
pub struct DataReaderBlob {
	blob: Blob,
}

impl From<Blob> for DataReaderBlob {
	fn from(blob: Blob) -> Self {
		DataReaderBlob { blob }
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderBlob {
	async fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		self.blob.read_range(range)
	}

	fn get_size(&self) -> u64 {
		self.blob.len()
	}

	fn get_name(&self) -> &str {
		"memory"
	}
}
