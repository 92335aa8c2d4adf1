//! What a finished conversion produced and what it had to leave out.

use hips2cog_core::{HealpixAddress, HipsError};
use std::{fmt, path::PathBuf};

/// Why a tile is absent from the mosaic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissingKind {
	Unavailable,
	Corrupt,
}

impl MissingKind {
	pub fn as_str(&self) -> &str {
		match self {
			MissingKind::Unavailable => "unavailable",
			MissingKind::Corrupt => "corrupt",
		}
	}
}

/// A tile whose region was painted with the placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingTile {
	pub address: HealpixAddress,
	pub location: String,
	pub kind: MissingKind,
	pub reason: String,
}

impl MissingTile {
	/// Classifies a per-tile error. Returns `None` for anything that is not a tile failure.
	pub fn from_error(address: HealpixAddress, error: &anyhow::Error) -> Option<MissingTile> {
		let (kind, location, reason) = match HipsError::find(error)? {
			HipsError::TileUnavailable { location, reason } => (MissingKind::Unavailable, location, reason),
			HipsError::TileCorrupt { location, reason } => (MissingKind::Corrupt, location, reason),
			_ => return None,
		};
		Some(MissingTile {
			address,
			location: location.clone(),
			kind,
			reason: reason.clone(),
		})
	}
}

impl fmt::Display for MissingTile {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} {} ({}): {}",
			self.kind.as_str(),
			self.address,
			self.location,
			self.reason
		)
	}
}

/// One image directory of the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSummary {
	pub order: u8,
	pub width: u32,
	pub height: u32,
	pub blocks_across: u32,
	pub blocks_down: u32,
	/// Bytes of compressed block data.
	pub payload_bytes: u64,
}

impl fmt::Display for LevelSummary {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"order {}: {}×{} px, {}×{} blocks, {} bytes",
			self.order, self.width, self.height, self.blocks_across, self.blocks_down, self.payload_bytes
		)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversionReport {
	pub output: PathBuf,
	/// Coarsest level first.
	pub levels: Vec<LevelSummary>,
	pub missing: Vec<MissingTile>,
}

impl ConversionReport {
	pub fn payload_bytes(&self) -> u64 {
		self.levels.iter().map(|l| l.payload_bytes).sum()
	}

	/// A few lines for the terminal: one per level plus the missing tiles, capped at `max_listed`.
	pub fn summary(&self, max_listed: usize) -> String {
		let mut lines = vec![format!("wrote {:?}", self.output)];
		lines.extend(self.levels.iter().map(|l| format!("  {l}")));
		if !self.missing.is_empty() {
			lines.push(format!("{} tiles were missing or corrupt:", self.missing.len()));
			lines.extend(self.missing.iter().take(max_listed).map(|m| format!("  {m}")));
			if self.missing.len() > max_listed {
				lines.push(format!("  … and {} more", self.missing.len() - max_listed));
			}
		}
		lines.join("\n")
	}
}
