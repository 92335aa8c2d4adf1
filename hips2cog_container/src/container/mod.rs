mod cog;
pub use cog::*;

mod converter;
pub use converter::*;

mod hips;
pub use hips::*;
