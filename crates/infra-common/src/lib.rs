/*!
Infrastructure shared by the qrlink binaries

- [`logging`]: tracing subscriber setup
- [`errors`]: setup and configuration errors
*/

pub mod errors;
pub mod logging;

pub use errors::{Error, Result};
pub use logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
