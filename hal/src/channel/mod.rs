//! I/O channels.
//!
//! Extends the sequential stream contract in two steps:
//! [`Channel`] adds timed variants of every blocking operation plus a
//! generic control path, and [`AsyncChannel`] adds an event source
//! through which interrupt-driven I/O conditions are broadcast to any
//! number of listeners. Applications written against these traits run
//! unchanged over any channel-capable peripheral.

use core::any::Any;

use common::event::EventSource;
use common::time::Timeout;

use crate::oop::stream::{SequentialStream, StreamError};

bitflags::bitflags! {
    /// I/O condition flags broadcast by asynchronous channels.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChnFlags: u32 {
        /// Connection happened.
        const CONNECTED = 1 << 0;
        /// Disconnection happened.
        const DISCONNECTED = 1 << 1;
        /// Data available in the input queue.
        const INPUT_AVAILABLE = 1 << 2;
        /// Output queue empty.
        const OUTPUT_EMPTY = 1 << 3;
        /// Transmission end.
        const TRANSMISSION_END = 1 << 4;
        /// Parity error.
        const PARITY_ERROR = 1 << 5;
        /// Framing error.
        const FRAMING_ERROR = 1 << 6;
        /// Line noise error.
        const NOISE_ERROR = 1 << 7;
        /// Overrun error.
        const OVERRUN_ERROR = 1 << 8;
        /// Receive line idle.
        const IDLE_DETECTED = 1 << 9;
        /// Break detected.
        const BREAK_DETECTED = 1 << 10;
        /// Receive buffer full.
        const BUFFER_FULL = 1 << 11;
    }
}

/// Out-of-band channel control requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlOp {
    /// Does nothing.
    Nop,
    /// Waits until the transmission of all buffered data completes.
    TxWait,
    /// Implementation-defined operation code.
    Driver(u32),
}

/// Stream with timed operations and a control path.
///
/// Every timed operation takes a [`Timeout`] budgeting the whole
/// call: [`Timeout::Immediate`] never blocks, [`Timeout::Infinite`]
/// blocks until completion or reset.
pub trait Channel: SequentialStream {
    /// Like [`SequentialStream::write`], bounded by `timeout`.
    /// Returns the number of bytes transferred before the budget ran
    /// out.
    fn write_timeout(&self, buf: &[u8], timeout: Timeout) -> usize;

    /// Like [`SequentialStream::read`], bounded by `timeout`.
    /// Returns the number of bytes transferred before the budget ran
    /// out.
    fn read_timeout(&self, buf: &mut [u8], timeout: Timeout) -> usize;

    /// Like [`SequentialStream::put`], bounded by `timeout`.
    fn put_timeout(&self, byte: u8, timeout: Timeout) -> Result<(), StreamError>;

    /// Like [`SequentialStream::get`], bounded by `timeout`.
    fn get_timeout(&self, timeout: Timeout) -> Result<u8, StreamError>;

    /// Performs an out-of-band control request.
    ///
    /// `arg` carries the operation-specific argument, if any.
    /// Implementations must accept unrecognized [`ControlOp::Driver`]
    /// codes as successful no-ops so that generic middleware can probe
    /// optional operations.
    fn control(&self, op: ControlOp, arg: Option<&mut dyn Any>) -> Result<(), StreamError>;
}

/// Channel able to report I/O conditions from interrupt context.
pub trait AsyncChannel: Channel {
    /// The event source broadcasting this channel's condition flags.
    ///
    /// Upper layers register their listeners here; the channel's
    /// service path signals it through [`add_flags`].
    ///
    /// [`add_flags`]: AsyncChannel::add_flags
    fn event_source(&self) -> &EventSource;

    /// Broadcasts condition flags to all registered listeners.
    ///
    /// Called from the service path — typically an interrupt handler —
    /// when an I/O condition arises. Never blocks and takes no lock,
    /// so it is safe regardless of what locks application threads
    /// hold.
    fn add_flags(&self, flags: ChnFlags) {
        self.event_source().broadcast(flags.bits());
    }
}
