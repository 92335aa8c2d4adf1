//! The `TileFetcherTrait`: raw bytes of one file below a HiPS root.
//!
//! Locations are relative to the root, e.g. `Norder3/Dir0/Npix12.jpg` or `properties`. A tile
//! that cannot be retrieved is reported as [`HipsError::TileUnavailable`] inside the returned
//! `anyhow::Error`, so callers can tell it apart from programming errors.

use super::{TileFetcherFile, TileFetcherHttp};
use crate::{Blob, HipsError};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use std::{fmt::Debug, path::Path};

pub type TileFetcher = Box<dyn TileFetcherTrait>;

#[async_trait]
pub trait TileFetcherTrait: Debug + Send + Sync {
	async fn fetch(&self, location: &str) -> Result<Blob>;

	/// Like [`fetch`](Self::fetch), but an unavailable file yields `None`.
	async fn fetch_optional(&self, location: &str) -> Result<Option<Blob>> {
		match self.fetch(location).await {
			Ok(blob) => Ok(Some(blob)),
			Err(e) if matches!(HipsError::find(&e), Some(HipsError::TileUnavailable { .. })) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Human-readable form of `location`, used in messages and reports.
	fn describe(&self, location: &str) -> String;

	fn get_name(&self) -> &str;
}

/// Chooses the HTTP fetcher for `http(s)://` roots and the file fetcher otherwise.
pub fn open_tile_fetcher(root: &str) -> Result<TileFetcher> {
	if root.starts_with("http://") || root.starts_with("https://") {
		Ok(Box::new(TileFetcherHttp::new(Url::parse(root)?)?))
	} else {
		Ok(Box::new(TileFetcherFile::new(Path::new(root))?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use assert_fs::TempDir;

	#[test]
	fn chooses_by_scheme() -> Result<()> {
		let dir = TempDir::new()?;
		let fetcher = open_tile_fetcher(dir.path().to_str().unwrap())?;
		assert!(format!("{fetcher:?}").starts_with("TileFetcherFile"));

		let fetcher = open_tile_fetcher("https://alasky.example.org/DSS/")?;
		assert!(format!("{fetcher:?}").starts_with("TileFetcherHttp"));
		Ok(())
	}
}
