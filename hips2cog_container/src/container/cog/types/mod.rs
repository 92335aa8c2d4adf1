mod header;
mod ifd;
pub mod tag;

pub use header::TiffHeader;
pub use ifd::{IFD_ALIGNMENT, Ifd};
pub use tag::TagValue;
