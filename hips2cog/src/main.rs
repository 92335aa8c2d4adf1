mod tools;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{ErrorLevel, Verbosity};

/// Converts HiPS all-sky tile pyramids into a single Cloud-Optimized TIFF.
#[derive(Parser, Debug)]
#[command(
	author,
	version,
	about,
	long_about = None,
	propagate_version = true,
	disable_help_subcommand = true,
)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[command(flatten)]
	verbose: Verbosity<ErrorLevel>,
}

#[derive(Subcommand, Debug)]
enum Commands {
	/// Convert a HiPS tree into a Cloud-Optimized TIFF
	Convert(tools::convert::Subcommand),

	/// Show the header, levels and byte ranges of a TIFF
	Probe(tools::probe::Subcommand),
}

fn main() -> Result<()> {
	let cli = Cli::parse();

	env_logger::Builder::new()
		.filter_level(cli.verbose.log_level_filter())
		.format_timestamp(None)
		.init();

	run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
	match &cli.command {
		Commands::Convert(arguments) => tools::convert::run(arguments),
		Commands::Probe(arguments) => tools::probe::run(arguments),
	}
}

#[cfg(test)]
mod tests {
	use crate::{Cli, run};
	use anyhow::Result;
	use clap::Parser;

	pub fn run_command(arg_vec: Vec<&str>) -> Result<String> {
		let cli = Cli::try_parse_from(arg_vec)?;
		let msg = format!("{cli:?}");
		run(&cli)?;
		Ok(msg)
	}

	#[test]
	fn help() {
		let err = run_command(vec!["hips2cog"]).unwrap_err().to_string();
		assert!(err.starts_with("Converts HiPS all-sky tile pyramids into a single Cloud-Optimized TIFF."));
		assert!(err.contains("\nUsage: hips2cog [OPTIONS] <COMMAND>"));
	}

	#[test]
	fn version() {
		let err = run_command(vec!["hips2cog", "-V"]).unwrap_err().to_string();
		assert!(err.starts_with("hips2cog "));
	}

	#[test]
	fn convert_subcommand() {
		let output = run_command(vec!["hips2cog", "convert"]).unwrap_err().to_string();
		assert!(output.starts_with("Convert a HiPS tree into a Cloud-Optimized TIFF"));
	}

	#[test]
	fn probe_subcommand() {
		let output = run_command(vec!["hips2cog", "probe"]).unwrap_err().to_string();
		assert!(output.starts_with("Show the header, levels and byte ranges of a TIFF"));
	}
}
