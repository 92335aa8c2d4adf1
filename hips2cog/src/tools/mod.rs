pub mod convert;
pub mod probe;
