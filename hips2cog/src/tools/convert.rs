use anyhow::Result;
use hips2cog_container::{ConvertConfig, IfdPlacement, MissingTilePolicy, TiffVariant, convert_hips_to_cog};
use hips2cog_core::{HipsTileFormat, TiffCompression};
use hips2cog_image::TileFill;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// HiPS root: a local directory or an http(s) URL
	#[arg()]
	root: String,

	/// finest HEALPix order to read, all coarser orders are derived from it
	#[arg()]
	order: u8,

	/// output file [default: <ORDER>.tif]
	#[arg(long, short, value_name = "FILE")]
	output: Option<PathBuf>,

	/// block compression
	#[arg(long, value_enum, default_value_t = TiffCompression::Deflate, display_order = 1)]
	compression: TiffCompression,

	/// JPEG quality, 1 to 99
	#[arg(long, value_name = "int", default_value_t = 90, display_order = 1)]
	quality: u8,

	/// edge length of the TIFF blocks, a power of two
	#[arg(long, value_name = "int", default_value_t = 256, display_order = 1)]
	block_size: u32,

	/// write a classic TIFF with 32-bit offsets instead of a BigTIFF
	#[arg(long, display_order = 2)]
	classic: bool,

	/// place the directories in chain order, full resolution first
	#[arg(long, display_order = 2)]
	chain_order: bool,

	/// placeholder for missing tiles: transparent, black, white or #RRGGBB
	#[arg(long, value_name = "COLOR", default_value = "transparent", display_order = 3)]
	fill: TileFill,

	/// encode JPEG tiles again instead of copying them into JPEG blocks of the same size
	#[arg(long, display_order = 2)]
	reencode: bool,

	/// abort when a tile is missing or corrupt
	#[arg(long, display_order = 3)]
	strict: bool,

	/// tile format of the HiPS tree [default: from properties, else jpeg]
	#[arg(long, value_enum, value_name = "FORMAT", display_order = 4)]
	format: Option<HipsTileFormat>,

	/// tile edge length in pixels [default: from properties, else the first tile]
	#[arg(long, value_name = "int", display_order = 4)]
	tile_size: Option<u32>,

	/// number of tiles fetched at the same time
	#[arg(long, value_name = "int", display_order = 4)]
	concurrency: Option<usize>,
}

impl Subcommand {
	fn to_config(&self) -> ConvertConfig {
		let mut config = ConvertConfig::new(self.order)
			.with_fill(self.fill)
			.with_compression(self.compression)
			.with_quality(self.quality)
			.with_block_size(self.block_size)
			.with_reencode(self.reencode);
		if let Some(output) = &self.output {
			config = config.with_output(output);
		}
		if self.classic {
			config = config.with_variant(TiffVariant::Classic);
		}
		if self.chain_order {
			config = config.with_placement(IfdPlacement::ChainOrder);
		}
		if self.strict {
			config = config.with_missing_tiles(MissingTilePolicy::Fail);
		}
		if let Some(format) = self.format {
			config = config.with_tile_format(format);
		}
		if let Some(size) = self.tile_size {
			config = config.with_tile_size(size);
		}
		if let Some(concurrency) = self.concurrency {
			config = config.with_fetch_concurrency(concurrency);
		}
		config
	}
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	let config = arguments.to_config();
	eprintln!("convert {:?} up to order {} into {:?}", arguments.root, config.max_order, config.output_path());

	let cancel = CancellationToken::new();
	let on_interrupt = cancel.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			log::warn!("interrupted, discarding the partial output");
			on_interrupt.cancel();
		}
	});

	let report = convert_hips_to_cog(&arguments.root, &config, cancel).await?;
	eprintln!("{}", report.summary(20));

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::Subcommand;
	use crate::tests::run_command;
	use anyhow::Result;
	use assert_fs::TempDir;
	use clap::Parser;
	use hips2cog_container::{ConvertConfig, IfdPlacement, MissingTilePolicy, TiffVariant, testing::write_sample_tree};
	use hips2cog_core::TiffCompression;
	use hips2cog_image::TileFill;
	use pretty_assertions::assert_eq;
	use std::path::PathBuf;

	#[derive(Parser)]
	struct Wrapper {
		#[command(flatten)]
		subcommand: Subcommand,
	}

	fn parse(args: &[&str]) -> ConvertConfig {
		let mut argv = vec!["convert"];
		argv.extend_from_slice(args);
		Wrapper::try_parse_from(argv).unwrap().subcommand.to_config()
	}

	#[test]
	fn defaults() {
		let config = parse(&["./hips", "3"]);
		assert_eq!(config.max_order, 3);
		assert_eq!(config.output_path(), PathBuf::from("3.tif"));
		assert_eq!(config.fill, TileFill::Transparent);
		assert_eq!(config.missing_tiles, MissingTilePolicy::Fill);
		assert_eq!(config.cog.compression, TiffCompression::Deflate);
		assert_eq!(config.cog.block_size, 256);
		assert_eq!(config.cog.variant, TiffVariant::BigTiff);
		assert_eq!(config.tile_format, None);
		assert!(!config.reencode);
	}

	#[test]
	fn options() {
		let config = parse(&[
			"./hips",
			"5",
			"-o",
			"sky.tif",
			"--compression",
			"jpeg",
			"--quality",
			"80",
			"--block-size",
			"512",
			"--classic",
			"--chain-order",
			"--reencode",
			"--fill",
			"#ff0000",
			"--strict",
			"--format",
			"png",
			"--tile-size",
			"64",
			"--concurrency",
			"3",
		]);
		assert_eq!(config.output_path(), PathBuf::from("sky.tif"));
		assert_eq!(config.cog.compression, TiffCompression::Jpeg);
		assert_eq!((config.cog.quality, config.cog.block_size), (80, 512));
		assert_eq!(config.cog.variant, TiffVariant::Classic);
		assert_eq!(config.cog.placement, IfdPlacement::ChainOrder);
		assert!(config.reencode);
		assert_eq!(config.fill.to_string(), "#ff0000");
		assert_eq!(config.missing_tiles, MissingTilePolicy::Fail);
		assert_eq!(config.tile_size, Some(64));
		assert_eq!(config.concurrency.fetch, 3);
		assert!(config.validate().is_ok());
	}

	#[test]
	fn rejects_bad_fill() {
		let result = Wrapper::try_parse_from(["convert", "./hips", "1", "--fill", "#12"]);
		assert!(result.is_err());
	}

	#[test]
	fn converts_sample_tree() -> Result<()> {
		let dir = TempDir::new()?;
		write_sample_tree(dir.path(), 8)?;
		let output = dir.path().join("sky.tif");

		run_command(vec![
			"hips2cog",
			"-q",
			"convert",
			&dir.path().to_string_lossy(),
			"1",
			"-o",
			&output.to_string_lossy(),
			"--block-size",
			"16",
		])?;
		assert!(output.exists());
		Ok(())
	}
}
