//! Atomic file output.
//!
//! `DataWriterFile` writes into a hidden temporary file in the target's directory. Only
//! [`finish`](DataWriterFile::finish) flushes, syncs and renames it onto the target path. If the
//! writer is dropped before that, for example because a conversion failed or was cancelled, the
//! temporary file is deleted and the target path is left untouched.
//!
//! ```rust
//! use hips2cog_core::{io::{DataWriterFile, DataWriterTrait}, Blob};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("3.tif");
//!
//! let mut writer = DataWriterFile::from_path(&path).unwrap();
//! writer.append(&Blob::from("II*\0")).unwrap();
//! assert!(!path.exists());
//!
//! writer.finish().unwrap();
//! assert_eq!(std::fs::read(&path).unwrap(), b"II*\0");
//! ```

use super::DataWriterTrait;
use crate::{Blob, ByteRange, HipsError};
use anyhow::Result;
use std::{
	io::{BufWriter, Write},
	path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

pub struct DataWriterFile {
	path: PathBuf,
	writer: BufWriter<NamedTempFile>,
	position: u64,
}

impl DataWriterFile {
	pub fn from_path(path: &Path) -> Result<DataWriterFile> {
		let parent = match path.parent() {
			Some(p) if !p.as_os_str().is_empty() => p,
			_ => Path::new("."),
		};
		let file = tempfile::Builder::new()
			.prefix(".hips2cog-")
			.suffix(".tmp")
			.tempfile_in(parent)
			.map_err(|e| HipsError::write_failed(path, e))?;

		log::debug!("staging {path:?} in {:?}", file.path());
		Ok(DataWriterFile {
			path: path.to_path_buf(),
			writer: BufWriter::with_capacity(1 << 20, file),
			position: 0,
		})
	}

	pub fn get_path(&self) -> &Path {
		&self.path
	}

	/// Flushes, syncs and moves the staged file onto the target path, replacing any previous file.
	pub fn finish(self) -> Result<()> {
		let path = self.path;
		let file = self
			.writer
			.into_inner()
			.map_err(|e| HipsError::write_failed(&path, e.into_error()))?;
		file.as_file().sync_all().map_err(|e| HipsError::write_failed(&path, e))?;
		file.persist(&path).map_err(|e| HipsError::write_failed(&path, e.error))?;
		log::debug!("finalized {path:?}");
		Ok(())
	}
}

impl DataWriterTrait for DataWriterFile {
	fn append(&mut self, blob: &Blob) -> Result<ByteRange> {
		self
			.writer
			.write_all(blob.as_slice())
			.map_err(|e| HipsError::write_failed(&self.path, e))?;
		let range = ByteRange::new(self.position, blob.len());
		self.position += blob.len();
		Ok(range)
	}

	fn get_position(&mut self) -> Result<u64> {
		Ok(self.position)
	}
}
