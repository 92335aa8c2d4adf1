//! The `properties` file at the root of a HiPS tree.
//!
//! A plain `key = value` list with `#` comments:
//!
//! ```text
//! creator_did     = ivo://CDS/P/DSS2/color
//! hips_order      = 9
//! hips_tile_width = 512
//! hips_tile_format = jpeg png
//! ```

use anyhow::{Context, Result};
use hips2cog_core::{Blob, HipsTileFormat};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HipsProperties {
	entries: BTreeMap<String, String>,
}

impl HipsProperties {
	pub fn parse(text: &str) -> HipsProperties {
		let entries = text
			.lines()
			.map(str::trim)
			.filter(|line| !line.is_empty() && !line.starts_with('#'))
			.filter_map(|line| line.split_once('='))
			.map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
			.filter(|(key, _)| !key.is_empty())
			.collect();
		HipsProperties { entries }
	}

	pub fn from_blob(blob: &Blob) -> HipsProperties {
		Self::parse(&blob.to_string_lossy())
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.entries.get(key).map(String::as_str)
	}

	/// `hips_tile_width`, in pixels.
	pub fn tile_width(&self) -> Result<Option<u32>> {
		self
			.get("hips_tile_width")
			.map(|v| v.parse::<u32>().with_context(|| format!("invalid hips_tile_width '{v}'")))
			.transpose()
	}

	/// First supported entry of `hips_tile_format`.
	pub fn tile_format(&self) -> Result<Option<HipsTileFormat>> {
		self.get("hips_tile_format").map(HipsTileFormat::from_properties).transpose()
	}

	/// `hips_order`, the deepest order the tree provides.
	pub fn max_order(&self) -> Result<Option<u8>> {
		self
			.get("hips_order")
			.map(|v| v.parse::<u8>().with_context(|| format!("invalid hips_order '{v}'")))
			.transpose()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DSS: &str = "
# DSS colored
creator_did      = ivo://CDS/P/DSS2/color
obs_title        = DSS colored
hips_order       = 9
hips_tile_width  = 512
hips_tile_format = fits jpeg
hips_frame = equatorial
broken line without separator
";

	#[test]
	fn parse() -> Result<()> {
		let properties = HipsProperties::parse(DSS);
		assert_eq!(properties.get("obs_title"), Some("DSS colored"));
		assert_eq!(properties.get("creator_did"), Some("ivo://CDS/P/DSS2/color"));
		assert_eq!(properties.get("hips_frame"), Some("equatorial"));
		assert_eq!(properties.get("broken line without separator"), None);
		assert_eq!(properties.max_order()?, Some(9));
		assert_eq!(properties.tile_width()?, Some(512));
		assert_eq!(properties.tile_format()?, Some(HipsTileFormat::Jpeg));
		Ok(())
	}

	#[test]
	fn missing_and_invalid_values() {
		let properties = HipsProperties::parse("hips_tile_width = wide\nhips_tile_format = fits");
		assert!(properties.tile_width().is_err());
		assert!(properties.tile_format().is_err());
		assert_eq!(properties.max_order().unwrap(), None);

		let empty = HipsProperties::from_blob(&Blob::new_empty());
		assert_eq!(empty, HipsProperties::default());
		assert_eq!(empty.tile_width().unwrap(), None);
	}
}
