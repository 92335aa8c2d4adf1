mod config;
pub use config::*;

mod report;
pub use report::*;
