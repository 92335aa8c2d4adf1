//! Tile codecs (JPEG, PNG, WebP). `all` dispatches on [`hips2cog_core::HipsTileFormat`].

mod all;

pub mod jpeg;
pub mod png;
pub mod webp;
pub use all::*;
