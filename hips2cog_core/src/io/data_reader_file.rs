//! Range reads from a local file.

use super::DataReaderTrait;
use crate::{Blob, ByteRange};
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use std::{
	fs::File,
	io::{Read, Seek, SeekFrom},
	path::Path,
};

#[derive(Debug)]
pub struct DataReaderFile {
	name: String,
	file: File,
	size: u64,
}

impl DataReaderFile {
	pub fn open(path: &Path) -> Result<Box<DataReaderFile>> {
		ensure!(path.exists(), "file {path:?} does not exist");
		ensure!(path.is_absolute(), "path {path:?} must be absolute");
		ensure!(path.is_file(), "path {path:?} must be a file");

		let path = path.canonicalize()?;
		let file = File::open(&path).with_context(|| format!("opening {path:?}"))?;
		let size = file.metadata()?.len();

		Ok(Box::new(DataReaderFile {
			name: path.to_string_lossy().into_owned(),
			file,
			size,
		}))
	}
}

#[async_trait]
impl DataReaderTrait for DataReaderFile {
	async fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		ensure!(
			range.end() <= self.size,
			"range {range} exceeds the size {} of file '{}'",
			self.size,
			self.name
		);
		let mut buffer = vec![0; range.length as usize];
		let mut file = self
			.file
			.try_clone()
			.with_context(|| format!("failed to clone file '{}'", self.name))?;
		file
			.seek(SeekFrom::Start(range.offset))
			.with_context(|| format!("failed to seek to offset {} in file '{}'", range.offset, self.name))?;
		file.read_exact(&mut buffer).with_context(|| {
			format!(
				"failed to read {} bytes at offset {} in file '{}'",
				range.length, range.offset, self.name
			)
		})?;
		Ok(Blob::from(buffer))
	}

	fn get_size(&self) -> u64 {
		self.size
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::NamedTempFile;
	use assert_fs::prelude::*;

	#[test]
	fn open() -> Result<()> {
		let file = NamedTempFile::new("level.tif")?;
		assert!(DataReaderFile::open(file.path()).is_err());

		file.write_binary(b"Hello, world!")?;
		let reader = DataReaderFile::open(file.path())?;
		assert_eq!(reader.get_size(), 13);
		assert!(reader.get_name().ends_with("level.tif"));

		assert!(DataReaderFile::open(Path::new("relative.tif")).is_err());
		Ok(())
	}

	#[tokio::test]
	async fn read_range() -> Result<()> {
		let file = NamedTempFile::new("level.tif")?;
		file.write_binary(b"Hello, world!")?;
		let reader = DataReaderFile::open(file.path())?;

		let blob = reader.read_range(&ByteRange::new(4, 6)).await?;
		assert_eq!(blob.as_slice(), b"o, wor");

		assert!(reader.read_range(&ByteRange::new(10, 6)).await.is_err());
		Ok(())
	}
}
