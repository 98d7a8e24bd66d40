/*!
Logging

Subscriber setup for the qrlink binaries: level and per-target directives,
optional JSON output, and a startup banner.
*/

pub mod setup;

pub use setup::{build_filter, log_welcome, parse_log_level, setup_logging, LoggingConfig};
