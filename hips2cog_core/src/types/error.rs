//! Error taxonomy of a HiPS → COG conversion.
//!
//! Everything else in the workspace propagates `anyhow::Error`; these typed variants travel inside it
//! and are recovered with `downcast_ref` where a policy decision depends on the kind of failure
//! (skip-and-fill of missing tiles, process exit codes).

use std::path::PathBuf;

/// The kinds of failure a conversion distinguishes.
#[derive(Debug, thiserror::Error)]
pub enum HipsError {
	/// A pixel index outside `[0, 12·4^order)`, a negative index or an order beyond the HEALPix limit.
	#[error("HEALPix address out of range: pixel index {pixel_index} is not valid at order {order}")]
	AddressOutOfRange { order: i64, pixel_index: i64 },

	/// The tile could not be retrieved (missing file, HTTP 404, network failure).
	#[error("tile '{location}' is unavailable: {reason}")]
	TileUnavailable { location: String, reason: String },

	/// The tile was retrieved but could not be decoded, or has the wrong dimensions.
	#[error("tile '{location}' is corrupt: {reason}")]
	TileCorrupt { location: String, reason: String },

	/// The output storage rejected a write.
	#[error("writing '{}' failed: {reason}", path.display())]
	WriteFailed { path: PathBuf, reason: String },

	/// The conversion was aborted at a tile-fetch or level boundary.
	#[error("conversion was cancelled")]
	Cancelled,
}

impl HipsError {
	pub fn unavailable(location: &str, reason: impl ToString) -> HipsError {
		HipsError::TileUnavailable {
			location: location.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn corrupt(location: &str, reason: impl ToString) -> HipsError {
		HipsError::TileCorrupt {
			location: location.to_string(),
			reason: reason.to_string(),
		}
	}

	pub fn write_failed(path: impl Into<PathBuf>, reason: impl ToString) -> HipsError {
		HipsError::WriteFailed {
			path: path.into(),
			reason: reason.to_string(),
		}
	}

	/// `true` for failures the mosaic builder may absorb by filling the tile's region.
	pub fn is_tile_failure(&self) -> bool {
		matches!(self, HipsError::TileUnavailable { .. } | HipsError::TileCorrupt { .. })
	}

	/// Finds a `HipsError` anywhere in the context chain of an `anyhow::Error`.
	pub fn find(error: &anyhow::Error) -> Option<&HipsError> {
		error.chain().find_map(|cause| cause.downcast_ref::<HipsError>())
	}
}
