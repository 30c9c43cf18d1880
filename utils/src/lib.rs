//! Shared utilities for Accord.

pub mod logging;

pub use logging::{init_logging, LogFormat, LogFormatError};
