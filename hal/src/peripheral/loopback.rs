//! Loopback communication driver.
//!
//! A purely software peripheral: bytes written to the transmit side
//! appear on the receive side through a fixed-capacity queue. It
//! implements the complete stack — referenced object, driver,
//! communication driver, stream, channel, asynchronous channel — and
//! is the reference for how a concrete UART or SIO driver composes
//! the base types.
//!
//! Blocking is polled: a blocked operation probes the queue once per
//! tick of its timeout budget, standing in for the kernel thread
//! suspension a real port would use. Stopping the driver resets the
//! queue and wakes every blocked caller with a reset status.

use core::any::Any;
use core::sync::atomic::{AtomicUsize, Ordering};

use common::event::EventSource;
use common::sync::SpinLock;
use common::time::{TickBudget, Timeout};

use crate::channel::{AsyncChannel, Channel, ChnFlags, ControlOp};
use crate::driver::base::{Driver, DriverCore, DriverState, HalError};
use crate::driver::com::{ComAttributes, ComDriver, ComInterface};
use crate::oop::object::Object;
use crate::oop::referenced::{RefCounter, ReferencedObject};
use crate::oop::stream::{SequentialStream, StreamError};

/// Loopback driver configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopbackConfig {
    /// Queue fill level, in bytes, at which [`ChnFlags::BUFFER_FULL`]
    /// is raised alongside the data-available condition. Must be
    /// between 1 and the queue capacity.
    pub full_watermark: usize,
}

struct Ring<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
    len: usize,
    // Bumped on every reset; blocked callers that observe a change
    // report StreamError::Reset instead of retrying.
    epoch: u32,
}

impl<const N: usize> Ring<N> {
    const fn new() -> Self {
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            len: 0,
            epoch: 0,
        }
    }

    fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn push(&mut self, byte: u8) -> bool {
        if self.len == N {
            return false;
        }
        self.buf[self.tail] = byte;
        self.tail = (self.tail + 1) % N;
        self.len += 1;
        true
    }

    fn pop(&mut self) -> Option<u8> {
        if self.len == 0 {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        self.len -= 1;
        Some(byte)
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Software loopback communication driver.
///
/// `N` is the queue capacity in bytes. The instance is placed by the
/// caller — typically in a static — and performs no allocation.
///
/// ```no_run
/// use hal::driver::Driver;
/// use hal::peripheral::loopback::LoopbackDriver;
///
/// static LOOP0: LoopbackDriver<16> = LoopbackDriver::new();
///
/// LOOP0.init();
/// LOOP0.open().unwrap();
/// ```
pub struct LoopbackDriver<const N: usize> {
    core: DriverCore,
    queue: SpinLock<Ring<N>>,
    watermark: AtomicUsize,
    events: EventSource,
}

impl<const N: usize> LoopbackDriver<N> {
    /// Creates a driver instance in the `Uninit` state.
    pub const fn new() -> Self {
        Self {
            core: DriverCore::new(),
            queue: SpinLock::new(Ring::new()),
            watermark: AtomicUsize::new(N),
            events: EventSource::new(),
        }
    }

    /// Completes object initialization, moving `Uninit` to `Stop`.
    ///
    /// # Panics
    ///
    /// Panics if called twice.
    pub fn init(&self) -> &Self {
        assert!(
            self.core.state() == DriverState::Uninit,
            "already initialized"
        );
        self.core.set_state(DriverState::Stop);
        self
    }

    /// Completes initialization and records the registry identifier.
    #[cfg(feature = "registry")]
    pub fn init_with_id(&self, id: u32) -> &Self {
        self.core.set_id(id);
        self.init()
    }

    /// Pushes one byte, polling until there is space, the budget runs
    /// out, or the queue is reset under the caller.
    fn push_wait(
        &self,
        byte: u8,
        budget: &mut TickBudget,
        epoch: &mut Option<u32>,
    ) -> Result<(), StreamError> {
        loop {
            if let Some(mut queue) = self.queue.try_lock() {
                match *epoch {
                    None => *epoch = Some(queue.epoch),
                    Some(seen) if seen != queue.epoch => return Err(StreamError::Reset),
                    _ => {}
                }
                if queue.push(byte) {
                    let fill = queue.len;
                    drop(queue);
                    let mut flags = ChnFlags::INPUT_AVAILABLE;
                    if fill >= self.watermark.load(Ordering::Relaxed) {
                        flags |= ChnFlags::BUFFER_FULL;
                    }
                    self.add_flags(flags);
                    return Ok(());
                }
            }
            if !budget.consume() {
                return Err(StreamError::Timeout);
            }
            core::hint::spin_loop();
        }
    }

    /// Pops one byte, polling until data arrives, the budget runs
    /// out, or the queue is reset under the caller.
    fn pop_wait(
        &self,
        budget: &mut TickBudget,
        epoch: &mut Option<u32>,
    ) -> Result<u8, StreamError> {
        loop {
            if let Some(mut queue) = self.queue.try_lock() {
                match *epoch {
                    None => *epoch = Some(queue.epoch),
                    Some(seen) if seen != queue.epoch => return Err(StreamError::Reset),
                    _ => {}
                }
                if let Some(byte) = queue.pop() {
                    let drained = queue.is_empty();
                    drop(queue);
                    if drained {
                        self.add_flags(ChnFlags::OUTPUT_EMPTY | ChnFlags::TRANSMISSION_END);
                    }
                    return Ok(byte);
                }
            }
            if !budget.consume() {
                return Err(StreamError::Timeout);
            }
            core::hint::spin_loop();
        }
    }
}

impl<const N: usize> Default for LoopbackDriver<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Object for LoopbackDriver<N> {
    fn dispose(&self) {
        self.core.dispose_check();
    }
}

impl<const N: usize> ReferencedObject for LoopbackDriver<N> {
    fn references(&self) -> &RefCounter {
        self.core.references()
    }
}

impl<const N: usize> Driver for LoopbackDriver<N> {
    fn core(&self) -> &DriverCore {
        &self.core
    }

    fn start(&self) -> Result<(), HalError> {
        self.queue.lock().clear();
        self.watermark.store(N, Ordering::Relaxed);
        self.add_flags(ChnFlags::CONNECTED);
        Ok(())
    }

    fn stop(&self) {
        // The epoch bump wakes blocked callers with a reset status.
        self.queue.lock().clear();
        self.add_flags(ChnFlags::DISCONNECTED);
    }

    fn apply_config(&self, config: &dyn Any) -> Result<(), HalError> {
        let config = config
            .downcast_ref::<LoopbackConfig>()
            .ok_or(HalError::ConfigError)?;
        if config.full_watermark == 0 || config.full_watermark > N {
            return Err(HalError::ConfigError);
        }
        self.watermark.store(config.full_watermark, Ordering::Relaxed);
        Ok(())
    }

    fn interface(&self) -> Option<&dyn Any> {
        Some(self)
    }
}

impl<const N: usize> ComDriver for LoopbackDriver<N> {
    fn com_interface(&self) -> ComInterface<'_> {
        ComInterface::Async(self)
    }

    fn com_attributes(&self) -> ComAttributes {
        ComAttributes::STREAM | ComAttributes::CHANNEL | ComAttributes::ASYNCHRONOUS
    }
}

impl<const N: usize> SequentialStream for LoopbackDriver<N> {
    fn write(&self, buf: &[u8]) -> usize {
        self.write_timeout(buf, Timeout::Infinite)
    }

    fn read(&self, buf: &mut [u8]) -> usize {
        self.read_timeout(buf, Timeout::Infinite)
    }

    fn put(&self, byte: u8) -> Result<(), StreamError> {
        self.put_timeout(byte, Timeout::Infinite)
    }

    fn get(&self) -> Result<u8, StreamError> {
        self.get_timeout(Timeout::Infinite)
    }
}

impl<const N: usize> Channel for LoopbackDriver<N> {
    fn write_timeout(&self, buf: &[u8], timeout: Timeout) -> usize {
        let mut budget = TickBudget::new(timeout);
        let mut epoch = None;
        let mut written = 0;
        for &byte in buf {
            if self.push_wait(byte, &mut budget, &mut epoch).is_err() {
                break;
            }
            written += 1;
        }
        written
    }

    fn read_timeout(&self, buf: &mut [u8], timeout: Timeout) -> usize {
        let mut budget = TickBudget::new(timeout);
        let mut epoch = None;
        let mut read = 0;
        for slot in buf.iter_mut() {
            match self.pop_wait(&mut budget, &mut epoch) {
                Ok(byte) => {
                    *slot = byte;
                    read += 1;
                }
                Err(_) => break,
            }
        }
        read
    }

    fn put_timeout(&self, byte: u8, timeout: Timeout) -> Result<(), StreamError> {
        let mut budget = TickBudget::new(timeout);
        let mut epoch = None;
        self.push_wait(byte, &mut budget, &mut epoch)
    }

    fn get_timeout(&self, timeout: Timeout) -> Result<u8, StreamError> {
        let mut budget = TickBudget::new(timeout);
        let mut epoch = None;
        self.pop_wait(&mut budget, &mut epoch)
    }

    fn control(&self, op: ControlOp, _arg: Option<&mut dyn Any>) -> Result<(), StreamError> {
        match op {
            ControlOp::Nop => Ok(()),
            ControlOp::TxWait => {
                let mut epoch = None;
                loop {
                    if let Some(queue) = self.queue.try_lock() {
                        match epoch {
                            None => epoch = Some(queue.epoch),
                            Some(seen) if seen != queue.epoch => {
                                return Err(StreamError::Reset);
                            }
                            _ => {}
                        }
                        if queue.is_empty() {
                            return Ok(());
                        }
                    }
                    core::hint::spin_loop();
                }
            }
            // Unknown driver-specific codes are accepted as no-ops.
            ControlOp::Driver(_) => Ok(()),
        }
    }
}

impl<const N: usize> AsyncChannel for LoopbackDriver<N> {
    fn event_source(&self) -> &EventSource {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened<const N: usize>() -> LoopbackDriver<N> {
        let driver = LoopbackDriver::<N>::new();
        driver.init();
        driver.open().unwrap();
        driver
    }

    #[test]
    fn init_moves_uninit_to_stop() {
        let driver = LoopbackDriver::<4>::new();
        assert_eq!(driver.core().state(), DriverState::Uninit);
        driver.init();
        assert_eq!(driver.core().state(), DriverState::Stop);
    }

    #[test]
    #[should_panic(expected = "already initialized")]
    fn double_init_is_fatal() {
        let driver = LoopbackDriver::<4>::new();
        driver.init();
        driver.init();
    }

    #[test]
    fn written_bytes_loop_back_in_order() {
        let driver = opened::<8>();
        assert_eq!(driver.write(b"abc"), 3);
        let mut buf = [0u8; 3];
        assert_eq!(driver.read(&mut buf), 3);
        assert_eq!(&buf, b"abc");
        driver.close();
    }

    #[test]
    fn immediate_get_on_empty_queue_times_out() {
        let driver = opened::<4>();
        assert_eq!(
            driver.get_timeout(Timeout::Immediate),
            Err(StreamError::Timeout)
        );
        driver.close();
    }

    #[test]
    fn immediate_put_on_full_queue_times_out() {
        let driver = opened::<2>();
        driver.put(b'x').unwrap();
        driver.put(b'y').unwrap();
        assert_eq!(
            driver.put_timeout(b'z', Timeout::Immediate),
            Err(StreamError::Timeout)
        );
        driver.close();
    }

    #[test]
    fn bounded_write_reports_short_count_on_timeout() {
        let driver = opened::<2>();
        assert_eq!(driver.write_timeout(b"abcd", Timeout::Ticks(8)), 2);
        driver.close();
    }

    #[test]
    fn queue_capacity_survives_wraparound() {
        let driver = opened::<4>();
        for round in 0..10u8 {
            assert_eq!(driver.write(&[round, round, round]), 3);
            let mut buf = [0u8; 3];
            assert_eq!(driver.read(&mut buf), 3);
            assert_eq!(buf, [round; 3]);
        }
        driver.close();
    }

    #[test]
    fn watermark_validation_rejects_bad_configs() {
        let driver = opened::<8>();
        assert_eq!(
            driver.configure(&LoopbackConfig { full_watermark: 0 }),
            Err(HalError::ConfigError)
        );
        assert_eq!(
            driver.configure(&LoopbackConfig { full_watermark: 9 }),
            Err(HalError::ConfigError)
        );
        assert_eq!(
            driver.configure(&LoopbackConfig { full_watermark: 4 }),
            Ok(())
        );
        driver.close();
    }

    #[test]
    fn tx_wait_completes_on_drained_queue() {
        let driver = opened::<4>();
        driver.put(b'a').unwrap();
        assert_eq!(driver.get(), Ok(b'a'));
        assert_eq!(driver.control(ControlOp::TxWait, None), Ok(()));
        driver.close();
    }

    #[test]
    fn unknown_control_codes_are_accepted() {
        let driver = opened::<4>();
        assert_eq!(driver.control(ControlOp::Driver(0x1234), None), Ok(()));
        assert_eq!(driver.control(ControlOp::Nop, None), Ok(()));
        driver.close();
    }

    #[test]
    fn interface_downcasts_to_the_concrete_driver() {
        let driver = opened::<4>();
        let any = driver.interface().unwrap();
        assert!(any.downcast_ref::<LoopbackDriver<4>>().is_some());
        driver.close();
    }

    #[test]
    fn com_interface_exposes_the_full_channel_stack() {
        let driver = opened::<4>();
        let attrs = driver.com_attributes();
        assert!(attrs.contains(ComAttributes::STREAM));
        assert!(attrs.contains(ComAttributes::CHANNEL));
        assert!(attrs.contains(ComAttributes::ASYNCHRONOUS));

        let interface = driver.com_interface();
        assert!(interface.as_channel().is_some());
        assert!(interface.as_async().is_some());
        let stream = interface.as_stream();
        assert_eq!(stream.write(b"ok"), 2);
        let mut buf = [0u8; 2];
        assert_eq!(stream.read(&mut buf), 2);
        driver.close();
    }

    #[test]
    fn stop_resets_the_queue() {
        let driver = opened::<4>();
        driver.put(b'q').unwrap();
        driver.close();
        driver.open().unwrap();
        assert_eq!(
            driver.get_timeout(Timeout::Immediate),
            Err(StreamError::Timeout)
        );
        driver.close();
    }
}
