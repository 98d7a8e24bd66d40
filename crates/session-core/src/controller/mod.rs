//! Negotiation controller
//!
//! [`ControllerHandle`] is the public face: it spawns the task that owns the
//! state machine and forwards commands to it over a single inbox.

mod handle;
mod state_machine;

pub use handle::ControllerHandle;
