//! Software peripherals built on the framework.
//!
//! Nothing here touches hardware registers; these drivers exist to
//! exercise the full driver/channel stack and to show how a concrete
//! peripheral composes the base types.

pub mod loopback;

pub use loopback::{LoopbackConfig, LoopbackDriver};
