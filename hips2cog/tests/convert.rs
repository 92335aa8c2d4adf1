mod test_utilities;
use predicates::str;
use pretty_assertions::assert_eq;
use std::fs;
use test_utilities::*;

#[test]
fn convert_sample_tree() {
	let dir = sample_tree();
	let output = dir.path().join("sky.tif");

	hips2cog_cmd()
		.args(["convert", &path_str(dir.path()), "1", "-o", &path_str(&output), "--block-size", "16"])
		.assert()
		.success()
		.stdout(str::is_empty())
		.stderr(str::contains("order 0: 32×24 px, 2×2 blocks"))
		.stderr(str::contains("order 1: 64×48 px, 4×3 blocks"));

	let head = fs::read(&output).expect("output file was not created");
	assert_eq!(&head[0..4], b"II+\0");
}

#[test]
fn convert_defaults_to_order_name() {
	let dir = sample_tree();

	hips2cog_cmd()
		.current_dir(dir.path())
		.args(["convert", ".", "0"])
		.assert()
		.success();

	assert!(dir.path().join("0.tif").exists());
}

#[test]
fn convert_reports_missing_tiles() {
	let dir = sample_tree();
	fs::remove_file(dir.path().join("Norder1/Dir0/Npix5.png")).unwrap();
	let output = dir.path().join("1.tif");

	hips2cog_cmd()
		.args(["convert", &path_str(dir.path()), "1", "-o", &path_str(&output)])
		.assert()
		.success()
		.stderr(str::contains("1 tiles were missing or corrupt"))
		.stderr(str::contains("unavailable 1/5"));
	assert!(output.exists());
}

#[test]
fn strict_convert_fails_without_output() {
	let dir = sample_tree();
	fs::remove_file(dir.path().join("Norder1/Dir0/Npix5.png")).unwrap();
	let output = dir.path().join("1.tif");

	hips2cog_cmd()
		.args(["convert", &path_str(dir.path()), "1", "-o", &path_str(&output), "--strict"])
		.assert()
		.failure()
		.code(1)
		.stderr(str::contains("is unavailable"));
	assert!(!output.exists());
}

#[test]
fn jpeg_needs_opaque_fill() {
	let dir = sample_tree();
	let output = dir.path().join("1.tif");

	hips2cog_cmd()
		.args(["convert", &path_str(dir.path()), "1", "-o", &path_str(&output), "--compression", "jpeg"])
		.assert()
		.failure()
		.stderr(str::contains("choose an opaque --fill"));

	hips2cog_cmd()
		.args([
			"convert",
			&path_str(dir.path()),
			"1",
			"-o",
			&path_str(&output),
			"--compression",
			"jpeg",
			"--fill",
			"black",
			"--classic",
		])
		.assert()
		.success();
	assert_eq!(&fs::read(&output).unwrap()[0..4], b"II*\0");
}

#[test]
fn probe_converted_file() {
	let dir = sample_tree();
	let output = dir.path().join("1.tif");
	hips2cog_cmd()
		.args(["convert", &path_str(dir.path()), "1", "-o", &path_str(&output), "--block-size", "16"])
		.assert()
		.success();

	hips2cog_cmd()
		.args(["probe", &path_str(&output)])
		.assert()
		.success()
		.stdout(str::starts_with("BigTIFF (little endian)"))
		.stdout(str::contains("level 1: 32×24 px"));
}
