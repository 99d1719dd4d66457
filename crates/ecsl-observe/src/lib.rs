//! Logging setup for launcher binaries.

mod logger;
pub use logger::*;
