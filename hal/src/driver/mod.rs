//! Driver lifecycle machinery.
//!
//! [`base`] holds the state machine shared by every stateful driver;
//! [`com`] layers the communication-interface queries on top of it.

pub mod base;
pub mod com;

pub use base::{Driver, DriverCore, DriverState, HalError};
pub use com::{ComAttributes, ComDriver, ComInterface};
