//! Ancestor of communication drivers.
//!
//! A communication driver is a stateful driver whose functional
//! interface is a byte stream or channel. This layer adds only the
//! queries identifying that interface and its shape — no new state —
//! so middleware can discover at run time how capable a driver's
//! communication path is and fall back to the plain stream contract
//! when that is all it needs.

use super::base::Driver;
use crate::channel::{AsyncChannel, Channel};
use crate::oop::stream::SequentialStream;

bitflags::bitflags! {
    /// Shape attributes of a driver's communication interface.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ComAttributes: u32 {
        /// Exposes the sequential stream operations.
        const STREAM = 1 << 0;
        /// Exposes the timed channel operations.
        const CHANNEL = 1 << 1;
        /// Broadcasts I/O conditions through an event source.
        const ASYNCHRONOUS = 1 << 2;
    }
}

/// Borrowed view of a driver's communication interface.
///
/// The variant is the most capable contract the driver implements;
/// the accessors recover the weaker contracts from it.
pub enum ComInterface<'a> {
    Stream(&'a dyn SequentialStream),
    Channel(&'a dyn Channel),
    Async(&'a dyn AsyncChannel),
}

impl<'a> ComInterface<'a> {
    /// The interface as a plain sequential stream.
    pub fn as_stream(&self) -> &'a dyn SequentialStream {
        match *self {
            ComInterface::Stream(stream) => stream,
            ComInterface::Channel(channel) => channel,
            ComInterface::Async(channel) => channel,
        }
    }

    /// The interface as a channel, if channel-capable.
    pub fn as_channel(&self) -> Option<&'a dyn Channel> {
        match *self {
            ComInterface::Stream(_) => None,
            ComInterface::Channel(channel) => Some(channel),
            ComInterface::Async(channel) => Some(channel),
        }
    }

    /// The interface as an asynchronous channel, if it broadcasts
    /// I/O conditions.
    pub fn as_async(&self) -> Option<&'a dyn AsyncChannel> {
        match *self {
            ComInterface::Async(channel) => Some(channel),
            _ => None,
        }
    }
}

/// Driver exposing a byte-oriented communication interface.
pub trait ComDriver: Driver {
    /// The communication interface of this driver instance.
    fn com_interface(&self) -> ComInterface<'_>;

    /// Attribute mask describing the interface shape.
    ///
    /// Must agree with the variant returned by [`com_interface`]:
    /// channel-capable implies stream-capable, asynchronous implies
    /// channel-capable.
    ///
    /// [`com_interface`]: ComDriver::com_interface
    fn com_attributes(&self) -> ComAttributes;
}
