//! Contains types like HEALPix addresses, byte ranges, tile formats, compressions and errors.

mod blob;
pub use blob::*;

mod byte_range;
pub use byte_range::*;

mod error;
pub use error::*;

mod healpix_address;
pub use healpix_address::*;

mod hips_tile_format;
pub use hips_tile_format::*;

mod tiff_compression;
pub use tiff_compression::*;
