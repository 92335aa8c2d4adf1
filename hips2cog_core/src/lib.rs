//! Shared building blocks for converting HiPS tile pyramids into Cloud-Optimized TIFFs:
//! HEALPix addressing, byte containers, the error taxonomy, I/O collaborators and progress output.

pub mod concurrency;
pub use concurrency::ConcurrencyLimits;

pub mod io;

pub mod progress;

pub mod types;
pub use types::*;
