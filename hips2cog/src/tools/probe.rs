use anyhow::Result;
use hips2cog_container::CogReader;

#[derive(clap::Args, Debug)]
#[command(arg_required_else_help = true, disable_version_flag = true)]
pub struct Subcommand {
	/// TIFF file or http(s) URL
	#[arg(required = true)]
	filename: String,

	/// also list the byte range of every block
	#[arg(long, short)]
	blocks: bool,
}

#[tokio::main]
pub async fn run(arguments: &Subcommand) -> Result<()> {
	eprintln!("probe {:?}", arguments.filename);

	let reader = CogReader::open_location(&arguments.filename).await?;
	print!("{}", describe(&reader, arguments.blocks));
	Ok(())
}

fn describe(reader: &CogReader, blocks: bool) -> String {
	let header = reader.header();
	let mut lines = vec![format!(
		"{} ({}), first directory at {}",
		header.variant.as_str(),
		if header.big_endian { "big endian" } else { "little endian" },
		header.first_ifd
	)];

	for (index, level) in reader.levels().iter().enumerate() {
		let data = level.data_range();
		lines.push(format!(
			"level {index}: {}×{} px, {} samples, {} blocks of {}×{} ({}), directory at {}, data {}",
			level.width,
			level.height,
			level.samples_per_pixel,
			level.tile_offsets.len(),
			level.block_width,
			level.block_height,
			level.compression,
			level.ifd_offset,
			data
		));
		if blocks {
			for row in 0..level.blocks_down() {
				for col in 0..level.blocks_across() {
					if let Ok(range) = level.block_range(col, row) {
						lines.push(format!("  block {col},{row}: {range}"));
					}
				}
			}
		}
	}
	lines.push(String::new());
	lines.join("\n")
}
