//! Kernel-Side Primitives
//!
//! This crate provides the small set of primitives the HAL object
//! framework consumes as opaque collaborators:
//!
//! - [`sync`]: busy-wait mutual exclusion with RAII guards
//! - [`event`]: interrupt-safe condition-flag broadcasting
//! - [`time`]: the tick/timeout model used by blocking operations
//!
//! Nothing here knows about drivers or channels; the framework layers
//! its contracts on top of these types without ever reaching into
//! their internals.

#![cfg_attr(not(test), no_std)]

pub mod event;
pub mod sync;
pub mod time;

pub use event::{EventFlags, EventListener, EventSource};
pub use sync::{SpinLock, SpinLockGuard};
pub use time::{TickBudget, Timeout};
