//! HAL Object Framework
//!
//! Composable base types for embedded peripheral drivers: a
//! polymorphic object hierarchy with reference-counted disposal, a
//! driver lifecycle state machine, and a uniform stream/channel I/O
//! abstraction. Concrete drivers (UART, SPI, USB-serial, ...) embed
//! these types and implement their traits; applications interact only
//! through the base-type operations, so higher-layer code works
//! unchanged across heterogeneous hardware.
//!
//! # Module Organization
//!
//! - [`oop`]: object identity, reference counting, synchronization,
//!   and the sequential stream contract
//! - [`channel`]: timed channel operations and interrupt-driven I/O
//!   condition flags
//! - [`driver`]: the driver state machine and the communication
//!   driver layer
//! - [`peripheral`]: software reference peripherals built on the
//!   framework
//!
//! # Design Principles
//!
//! 1. **Caller placement**: no allocation anywhere; every object is
//!    placed by its owner, typically in a static
//! 2. **Traits at the dispatch boundary**: concrete types are used
//!    directly where known, trait objects only where drivers must be
//!    handled uniformly
//! 3. **Shared lifecycle logic**: open/close counting and disposal
//!    live here exactly once; drivers supply only the physical hooks
//! 4. **Fatal contract violations**: mismatched open/close/release
//!    pairs panic at the point of violation instead of corrupting
//!    state
//!
//! # Usage Example
//!
//! ```no_run
//! use hal::driver::{ComDriver, Driver};
//! use hal::peripheral::loopback::LoopbackDriver;
//!
//! static SERIAL: LoopbackDriver<64> = LoopbackDriver::new();
//!
//! SERIAL.init();
//! SERIAL.open().expect("start failed");
//! let stream = SERIAL.com_interface().as_stream();
//! stream.write(b"hello");
//! SERIAL.close();
//! ```

#![cfg_attr(not(test), no_std)]

pub mod channel;
pub mod driver;
pub mod oop;
pub mod peripheral;

// Re-export commonly used types
pub use channel::{AsyncChannel, Channel, ChnFlags, ControlOp};
pub use driver::{ComAttributes, ComDriver, ComInterface, Driver, DriverCore, DriverState, HalError};
pub use oop::{Object, RefCounter, ReferencedObject, SequentialStream, StreamError, SynchronizedObject};
