//! Byte-level I/O: random-access readers, sequential writers, value codecs and tile fetchers.
//!
//! # Overview
//!
//! - [`DataReaderTrait`] reads byte ranges of a finished file, locally or through HTTP range
//!   requests. The COG reader is built on it.
//! - [`DataWriterTrait`] appends bytes sequentially. [`DataWriterFile`] stages everything in a
//!   temporary file next to the target and only renames it into place in [`DataWriterFile::finish`].
//! - [`ValueWriter`] and [`ValueReader`] encode and decode fixed-width integers in a chosen byte order.
//! - [`TileFetcherTrait`] retrieves the raw bytes of one HiPS tile from a directory tree or a web server.

mod data_reader;
mod data_reader_blob;
mod data_reader_file;
mod data_reader_http;
mod data_writer;
mod data_writer_blob;
mod data_writer_file;
mod http_client;
mod tile_fetcher;
mod tile_fetcher_file;
mod tile_fetcher_http;
mod value_reader;
mod value_writer;

pub use data_reader::*;
pub use data_reader_blob::*;
pub use data_reader_file::*;
pub use data_reader_http::*;
pub use data_writer::*;
pub use data_writer_blob::*;
pub use data_writer_file::*;
pub use http_client::*;
pub use tile_fetcher::*;
pub use tile_fetcher_file::*;
pub use tile_fetcher_http::*;
pub use value_reader::*;
pub use value_writer::*;
