#![allow(unused)]

use assert_cmd::{Command, cargo};
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

#[cfg(windows)]
pub const BINARY_NAME: &str = "hips2cog.exe";
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "hips2cog";

/// Helper to create a Command for the hips2cog binary.
pub fn hips2cog_cmd() -> Command {
	Command::new(cargo::cargo_bin!())
}

/// Helper to create a synthetic HiPS tree (orders 0 and 1, 8 px tiles) in a temp dir.
pub fn sample_tree() -> TempDir {
	let dir = tempdir().expect("failed to create temp dir");
	hips2cog_container::testing::write_sample_tree(dir.path(), 8).expect("failed to write sample tree");
	dir
}

pub fn path_str(path: &Path) -> String {
	path.to_string_lossy().into_owned()
}
