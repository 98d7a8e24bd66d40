/*!
Error Handling

Error type shared by the qrlink binaries for setup and configuration
failures that happen outside any negotiation.
*/

pub mod types;

pub use types::{Error, Result};
