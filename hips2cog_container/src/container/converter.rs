//! Runs a whole conversion: HiPS tree in, one COG out.
//!
//! ```text
//! TileSource → MosaicBuilder (max order) → CogWriter.add_level
//!                                        → PyramidReducer → CogWriter.add_level → … → order 0
//!            → CogWriter.finish_to_path
//! ```
//!
//! Only one level is resident at any time: each level is spooled by the writer before it is
//! handed to the reducer, which consumes it. The output file appears only after the last byte is
//! written; a failure or cancellation at any point leaves the target path untouched.

use super::{CogWriter, TileSource};
use crate::{ConversionReport, ConvertConfig, MosaicBuilder, PyramidReducer};
use anyhow::{Result, bail};
use hips2cog_core::HipsError;
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// Converts the HiPS tree at `root` (directory or URL) up to `config.max_order`.
pub async fn convert_hips_to_cog(root: &str, config: &ConvertConfig, cancel: CancellationToken) -> Result<ConversionReport> {
	config.validate()?;
	let output = config.output_path();
	let spool_dir = match output.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
		_ => Path::new(".").to_path_buf(),
	};
	if !spool_dir.is_dir() {
		bail!(HipsError::write_failed(&output, "the output directory does not exist"));
	}

	let source = TileSource::open(root, config).await?;
	let mut writer = CogWriter::new(config.cog.clone(), config.fill, &spool_dir)?
		.with_limits(config.concurrency)
		.with_silent(config.silent);

	let builder = MosaicBuilder::new(&source, config.missing_tiles, config.concurrency).with_silent(config.silent);
	let (mut level, missing) = builder.build_level(config.max_order, &cancel).await?;

	let reducer = PyramidReducer::new(config.concurrency).with_silent(config.silent);
	loop {
		if cancel.is_cancelled() {
			bail!(HipsError::Cancelled);
		}
		let summary = writer.add_level(&level, &cancel).await?;
		log::info!("{summary}");
		if level.order() == 0 {
			break;
		}
		level = reducer.reduce(level, &cancel).await?;
	}
	drop(level);

	if cancel.is_cancelled() {
		bail!(HipsError::Cancelled);
	}
	let levels = writer.summaries();
	writer.finish_to_path(&output).await?;
	log::info!("finished {output:?}");

	Ok(ConversionReport {
		output,
		levels,
		missing,
	})
}
