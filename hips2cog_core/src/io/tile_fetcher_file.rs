use super::TileFetcherTrait;
use crate::{Blob, HipsError};
use anyhow::{Result, ensure};
use async_trait::async_trait;
use std::{
	io::ErrorKind,
	path::{Path, PathBuf},
};

/// Reads tiles from a HiPS tree on a local file system.
#[derive(Debug)]
pub struct TileFetcherFile {
	root: PathBuf,
	name: String,
}

impl TileFetcherFile {
	pub fn new(root: &Path) -> Result<TileFetcherFile> {
		let root = std::path::absolute(root)?;
		ensure!(root.is_dir(), "HiPS root {root:?} is not a directory");
		Ok(TileFetcherFile {
			name: root.to_string_lossy().into_owned(),
			root,
		})
	}
}

#[async_trait]
impl TileFetcherTrait for TileFetcherFile {
	async fn fetch(&self, location: &str) -> Result<Blob> {
		let path = self.root.join(location);
		match tokio::fs::read(&path).await {
			Ok(data) => Ok(Blob::from(data)),
			Err(e) if e.kind() == ErrorKind::NotFound => Err(HipsError::unavailable(&self.describe(location), "file not found").into()),
			Err(e) => Err(HipsError::unavailable(&self.describe(location), e).into()),
		}
	}

	fn describe(&self, location: &str) -> String {
		self.root.join(location).to_string_lossy().into_owned()
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::{TempDir, prelude::*};

	#[tokio::test]
	async fn fetch() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("Norder0/Dir0/Npix3.png").write_binary(b"tile")?;
		let fetcher = TileFetcherFile::new(dir.path())?;

		assert_eq!(fetcher.fetch("Norder0/Dir0/Npix3.png").await?.as_slice(), b"tile");

		let error = fetcher.fetch("Norder0/Dir0/Npix4.png").await.unwrap_err();
		assert!(matches!(HipsError::find(&error), Some(HipsError::TileUnavailable { .. })));
		assert!(error.to_string().contains("Npix4.png"));
		Ok(())
	}

	#[tokio::test]
	async fn fetch_optional() -> Result<()> {
		let dir = TempDir::new()?;
		dir.child("properties").write_str("hips_order = 3\n")?;
		let fetcher = TileFetcherFile::new(dir.path())?;

		assert!(fetcher.fetch_optional("properties").await?.is_some());
		assert!(fetcher.fetch_optional("Moc.fits").await?.is_none());
		Ok(())
	}

	#[test]
	fn root_must_be_a_directory() {
		assert!(TileFetcherFile::new(Path::new("/nonexistent/hips")).is_err());
	}
}
