//! Driver lifecycle scenarios exercised through the base-type
//! operations only, the way applications and middleware consume
//! drivers.

use core::any::Any;
use core::sync::atomic::{AtomicUsize, Ordering};

use hal::driver::{Driver, DriverCore, DriverState, HalError};
use hal::oop::{Object, RefCounter, ReferencedObject};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ClockConfig {
    divisor: u32,
}

/// Minimal concrete driver recording how often its physical hooks run.
struct CountingDriver {
    core: DriverCore,
    starts: AtomicUsize,
    stops: AtomicUsize,
    fail_start: bool,
}

impl CountingDriver {
    fn new(fail_start: bool) -> Self {
        let driver = Self {
            core: DriverCore::new(),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            fail_start,
        };
        driver.core.set_state(DriverState::Stop);
        driver
    }
}

impl Object for CountingDriver {
    fn dispose(&self) {
        self.core.dispose_check();
    }
}

impl ReferencedObject for CountingDriver {
    fn references(&self) -> &RefCounter {
        self.core.references()
    }
}

impl Driver for CountingDriver {
    fn core(&self) -> &DriverCore {
        &self.core
    }

    fn start(&self) -> Result<(), HalError> {
        self.starts.fetch_add(1, Ordering::Relaxed);
        if self.fail_start {
            Err(HalError::NoResource)
        } else {
            Ok(())
        }
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::Relaxed);
    }

    fn apply_config(&self, config: &dyn Any) -> Result<(), HalError> {
        config
            .downcast_ref::<ClockConfig>()
            .ok_or(HalError::ConfigError)
            .and_then(|config| {
                if config.divisor == 0 {
                    Err(HalError::ConfigError)
                } else {
                    Ok(())
                }
            })
    }
}

#[test]
fn two_openers_share_one_physical_start_and_stop() {
    let driver = CountingDriver::new(false);
    let observed: Vec<u32> = {
        let mut seq = vec![driver.core().open_count()];
        driver.open().unwrap();
        seq.push(driver.core().open_count());
        driver.open().unwrap();
        seq.push(driver.core().open_count());
        driver.close();
        seq.push(driver.core().open_count());
        driver.close();
        seq.push(driver.core().open_count());
        seq
    };
    assert_eq!(observed, [0, 1, 2, 1, 0]);
    assert_eq!(driver.starts.load(Ordering::Relaxed), 1);
    assert_eq!(driver.stops.load(Ordering::Relaxed), 1);
    assert_eq!(driver.core().state(), DriverState::Stop);
}

#[test]
fn second_opener_never_sees_reinitialized_hardware() {
    let driver = CountingDriver::new(false);
    driver.open().unwrap();
    for _ in 0..5 {
        driver.open().unwrap();
        driver.close();
    }
    // Still open once; the hardware was started exactly once.
    assert_eq!(driver.starts.load(Ordering::Relaxed), 1);
    assert_eq!(driver.stops.load(Ordering::Relaxed), 0);
    driver.close();
    assert_eq!(driver.stops.load(Ordering::Relaxed), 1);
}

#[test]
fn failed_start_returns_the_status_and_keeps_the_driver_closed() {
    let driver = CountingDriver::new(true);
    assert_eq!(driver.open(), Err(HalError::NoResource));
    assert_eq!(driver.core().open_count(), 0);
    assert_eq!(driver.core().state(), DriverState::Stop);
    assert_eq!(driver.stops.load(Ordering::Relaxed), 0);
}

#[test]
#[should_panic(expected = "close without a matching open")]
fn close_of_a_closed_driver_is_fatal() {
    let driver = CountingDriver::new(false);
    driver.open().unwrap();
    driver.close();
    driver.close();
}

#[test]
fn configure_passes_the_hook_status_through() {
    let driver = CountingDriver::new(false);
    driver.open().unwrap();
    assert_eq!(driver.configure(&ClockConfig { divisor: 8 }), Ok(()));
    assert_eq!(
        driver.configure(&ClockConfig { divisor: 0 }),
        Err(HalError::ConfigError)
    );
    driver.close();
}

#[test]
#[should_panic(expected = "not open")]
fn configure_before_open_is_fatal() {
    let driver = CountingDriver::new(false);
    let _ = driver.configure(&ClockConfig { divisor: 8 });
}

#[test]
fn shared_holders_dispose_on_the_last_release_only() {
    let driver = CountingDriver::new(false);
    driver.add_reference();
    driver.add_reference();
    assert_eq!(driver.reference_count(), 3);
    assert_eq!(driver.release(), 2);
    assert_eq!(driver.release(), 1);
    assert_eq!(driver.release(), 0);
}

#[test]
#[should_panic(expected = "disposed while open")]
fn last_release_while_still_open_is_fatal() {
    let driver = CountingDriver::new(false);
    driver.open().unwrap();
    driver.release();
}

#[cfg(feature = "driver-mutex")]
#[test]
fn open_close_under_the_instance_lock() {
    let driver = CountingDriver::new(false);
    {
        let _section = driver.core().lock();
        driver.open().unwrap();
    }
    {
        let _section = driver.core().lock();
        driver.close();
    }
    assert_eq!(driver.starts.load(Ordering::Relaxed), 1);
    assert_eq!(driver.stops.load(Ordering::Relaxed), 1);
}
