//! The `DataReaderTrait`: random access to the bytes of a finished file.
//!
//! # Examples
//!
//! ```rust
//! use hips2cog_core::{io::{DataReader, DataReaderBlob}, Blob, ByteRange};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let reader: DataReader = Box::new(DataReaderBlob::from(Blob::from("II*\0")));
//!     assert_eq!(reader.read_range(&ByteRange::new(0, 2)).await?.as_slice(), b"II");
//!     assert_eq!(reader.get_size(), 4);
//!     Ok(())
//! }
//! ```

use super::{DataReaderFile, DataReaderHttp};
use crate::{Blob, ByteRange};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use std::{fmt::Debug, path::Path};

pub type DataReader = Box<dyn DataReaderTrait>;

#[async_trait]
pub trait DataReaderTrait: Debug + Send + Sync {
	/// Reads exactly `range.length` bytes starting at `range.offset`.
	async fn read_range(&self, range: &ByteRange) -> Result<Blob>;

	/// Total size in bytes. HTTP readers learn it from the first response, before that it is 0.
	fn get_size(&self) -> u64;

	fn get_name(&self) -> &str;
}

/// Opens `location` as a URL when it starts with `http://` or `https://`, otherwise as a local path.
pub fn open_data_reader(location: &str) -> Result<DataReader> {
	if location.starts_with("http://") || location.starts_with("https://") {
		let reader = DataReaderHttp::from_url(Url::parse(location)?)?;
		Ok(reader)
	} else {
		let path = std::path::absolute(Path::new(location))?;
		Ok(DataReaderFile::open(&path)?)
	}
}
