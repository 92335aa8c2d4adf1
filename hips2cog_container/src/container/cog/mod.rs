//! The writing side: TIFF directories and the Cloud-Optimized layout.

mod reader;
mod types;
mod writer;

pub use reader::{CogLevel, CogReader};
pub use types::{TiffHeader, tag};
pub use writer::CogWriter;
