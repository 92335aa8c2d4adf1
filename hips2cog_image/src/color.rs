//! Color parsing.

use anyhow::{Result, anyhow, bail};

/// Parses a hex color string into RGB or RGBA bytes.
///
/// Accepts `RGB`, `RGBA`, `RRGGBB` and `RRGGBBAA`, with an optional leading `#`.
///
/// ```
/// use hips2cog_image::color::parse_hex_color;
///
/// assert_eq!(parse_hex_color("FF5733").unwrap(), vec![255, 87, 51]);
/// assert_eq!(parse_hex_color("#F00").unwrap(), vec![255, 0, 0]);
/// assert_eq!(parse_hex_color("FF573380").unwrap(), vec![255, 87, 51, 128]);
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Vec<u8>> {
	let hex = hex.trim().trim_start_matches('#');
	if !hex.is_ascii() {
		bail!("Invalid hex color '{hex}': expected hex characters");
	}

	let expanded: String = match hex.len() {
		3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
		6 | 8 => hex.to_string(),
		_ => bail!("Invalid hex color '{hex}': expected 3, 4, 6, or 8 hex characters"),
	};

	(0..expanded.len())
		.step_by(2)
		.map(|i| u8::from_str_radix(&expanded[i..i + 2], 16))
		.collect::<Result<Vec<u8>, _>>()
		.map_err(|e| anyhow!("Invalid hex color '{hex}': {e}"))
}
