//! Ancestor of all stateful drivers.
//!
//! Every driver shares the same lifecycle: a state variable, an
//! open-reference count driving physical start/stop, reference-counted
//! disposal, and (feature-dependent) per-instance mutual exclusion and
//! a registry identifier. Concrete drivers embed a [`DriverCore`] and
//! implement the physical hooks of [`Driver`]; the state machine
//! itself lives here exactly once.

use core::any::Any;
use core::fmt;
use core::ptr;
use core::sync::atomic::{AtomicPtr, AtomicU8, AtomicU32, Ordering};

#[cfg(feature = "driver-mutex")]
use common::sync::{SpinLock, SpinLockGuard};

use crate::oop::referenced::{RefCounter, ReferencedObject};

/// Driver lifecycle states.
///
/// ```text
/// Uninit -> Stop <-> {Ready, Active} -> Error
/// ```
///
/// `Error` is reachable from any started state on a failed internal
/// operation; there is no generic recovery transition — getting back
/// to `Stop` is driver-specific.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum DriverState {
    /// Not yet initialized by the concrete driver.
    Uninit = 0,
    /// Initialized, peripheral powered down.
    Stop = 1,
    /// Peripheral started and idle.
    Ready = 2,
    /// Peripheral actively transferring.
    Active = 3,
    /// A failed internal operation left the peripheral unusable.
    Error = 4,
}

impl DriverState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DriverState::Uninit,
            1 => DriverState::Stop,
            2 => DriverState::Ready,
            3 => DriverState::Active,
            4 => DriverState::Error,
            _ => unreachable!("invalid driver state"),
        }
    }
}

/// Failure codes returned by driver operations.
///
/// Extends the stream status domain with the outcomes of physical
/// start and configuration; success is the `Ok` arm of the
/// surrounding `Result`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HalError {
    /// A required resource could not be obtained.
    NoResource,
    /// The peripheral is busy with a previous operation.
    HwBusy,
    /// The peripheral reported a hardware failure.
    HwFailure,
    /// The supplied configuration is invalid for this peripheral.
    ConfigError,
}

/// State block embedded by every concrete driver.
///
/// Holds the reference counter, the lifecycle state, the open count,
/// the owner pointer and, depending on build features, the instance
/// mutex and the registry identifier. The count and state are only
/// mutated by [`Driver::open`]/[`Driver::close`] and by the accessors
/// below; when the `driver-mutex` feature is enabled, [`lock`]
/// serializes open/close/configure sequences across threads.
///
/// [`lock`]: DriverCore::lock
pub struct DriverCore {
    references: RefCounter,
    state: AtomicU8,
    open_count: AtomicU32,
    owner: AtomicPtr<()>,
    #[cfg(feature = "driver-mutex")]
    mutex: SpinLock<()>,
    #[cfg(feature = "registry")]
    id: AtomicU32,
}

impl DriverCore {
    /// Creates a core in the `Uninit` state holding one reference.
    ///
    /// Concrete drivers call this from their static initializer and
    /// move the state to `Stop` once the instance is fully usable.
    pub const fn new() -> Self {
        Self {
            references: RefCounter::new(),
            state: AtomicU8::new(DriverState::Uninit as u8),
            open_count: AtomicU32::new(0),
            owner: AtomicPtr::new(ptr::null_mut()),
            #[cfg(feature = "driver-mutex")]
            mutex: SpinLock::new(()),
            #[cfg(feature = "registry")]
            id: AtomicU32::new(0),
        }
    }

    /// The embedded reference counter.
    pub fn references(&self) -> &RefCounter {
        &self.references
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        DriverState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Sets the lifecycle state without validation.
    ///
    /// Used by `open`/`close` and by concrete drivers from their
    /// service paths (for example `Ready` → `Active` around a
    /// transfer); callers must respect the state machine.
    pub fn set_state(&self, state: DriverState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Number of outstanding `open` calls.
    ///
    /// Zero only in the `Uninit` and `Stop` states; the peripheral is
    /// physically active exactly while this is non-zero.
    pub fn open_count(&self) -> u32 {
        self.open_count.load(Ordering::Acquire)
    }

    /// Upper-layer entity holding the logical claim on this driver,
    /// or null.
    ///
    /// At most one claimant by convention; exclusivity is not checked
    /// here and is independent of the open count.
    pub fn owner(&self) -> *mut () {
        self.owner.load(Ordering::Acquire)
    }

    /// Records the logical claimant (null clears the claim).
    pub fn set_owner(&self, owner: *mut ()) {
        self.owner.store(owner, Ordering::Release);
    }

    /// Enters the instance critical section.
    ///
    /// Guards driver state and configuration against concurrent
    /// access; independent of the open/close counting. The section
    /// ends when the guard drops.
    #[cfg(feature = "driver-mutex")]
    pub fn lock(&self) -> SpinLockGuard<'_, ()> {
        self.mutex.lock()
    }

    /// Registry identifier of this instance.
    #[cfg(feature = "registry")]
    pub fn id(&self) -> u32 {
        self.id.load(Ordering::Relaxed)
    }

    /// Assigns the registry identifier.
    #[cfg(feature = "registry")]
    pub fn set_id(&self, id: u32) {
        self.id.store(id, Ordering::Relaxed);
    }

    /// Finalization helper for concrete disposers.
    ///
    /// # Panics
    ///
    /// Panics if the driver is still open or still referenced — a
    /// driver must never be destroyed while claimed by an opener.
    pub fn dispose_check(&self) {
        assert!(self.open_count() == 0, "disposed while open");
        assert!(
            self.references.count() == 0,
            "disposed with outstanding references"
        );
    }
}

impl Default for DriverCore {
    fn default() -> Self {
        Self::new()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "registry")] {
        impl fmt::Debug for DriverCore {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct("DriverCore")
                    .field("id", &self.id())
                    .field("state", &self.state())
                    .field("open_count", &self.open_count())
                    .field("references", &self.references.count())
                    .finish()
            }
        }
    } else {
        impl fmt::Debug for DriverCore {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct("DriverCore")
                    .field("state", &self.state())
                    .field("open_count", &self.open_count())
                    .field("references", &self.references.count())
                    .finish()
            }
        }
    }
}

/// Stateful driver contract.
///
/// Concrete drivers implement the physical hooks ([`start`], [`stop`],
/// [`apply_config`]) and expose their [`DriverCore`]; applications use
/// only the provided operations. The peripheral is physically started
/// by the first `open` and stopped by the last `close`; openers in
/// between see it already running. Concurrent open/close sequences on
/// one instance must be serialized with [`DriverCore::lock`] (or an
/// external equivalent when the `driver-mutex` feature is disabled).
///
/// [`start`]: Driver::start
/// [`stop`]: Driver::stop
/// [`apply_config`]: Driver::apply_config
pub trait Driver: ReferencedObject {
    /// The embedded driver state block.
    fn core(&self) -> &DriverCore;

    /// Physically starts the peripheral using an
    /// implementation-default configuration.
    ///
    /// Called by [`open`] for the first opener only. A hook that fails
    /// may leave the state at `Error` to record an unusable
    /// peripheral; otherwise `open` moves it back to `Stop`.
    ///
    /// [`open`]: Driver::open
    fn start(&self) -> Result<(), HalError>;

    /// Physically stops the peripheral.
    ///
    /// Called by [`close`] for the last closer only, after the state
    /// has moved to `Stop`.
    ///
    /// [`close`]: Driver::close
    fn stop(&self);

    /// Applies a new configuration.
    ///
    /// Only called while the driver is open. The operation is only
    /// well-defined while the peripheral is not actively transferring;
    /// enforcing that is the concrete driver's responsibility.
    fn apply_config(&self, config: &dyn Any) -> Result<(), HalError>;

    /// Concrete functional interface of the driver, if any.
    ///
    /// Drivers exposing no interface return `None`; callers downcast
    /// the returned reference to the concrete type they expect.
    fn interface(&self) -> Option<&dyn Any> {
        None
    }

    /// Opens the driver.
    ///
    /// The first opener physically starts the peripheral; on success
    /// the open count becomes one and the state `Ready`. On failure
    /// the open count stays at zero, the state is `Stop` (or `Error`
    /// if [`start`] left it there) and the error is propagated, so a
    /// retry is safe. Subsequent openers only increment the count —
    /// the hardware is never re-initialized.
    ///
    /// [`start`]: Driver::start
    fn open(&self) -> Result<(), HalError> {
        let core = self.core();
        if core.open_count() == 0 {
            match self.start() {
                Ok(()) => {
                    core.open_count.store(1, Ordering::Release);
                    core.set_state(DriverState::Ready);
                    trace_lifecycle(core, "started");
                    Ok(())
                }
                Err(err) => {
                    if core.state() != DriverState::Error {
                        core.set_state(DriverState::Stop);
                    }
                    log::debug!("driver start failed: {:?}", err);
                    Err(err)
                }
            }
        } else {
            core.open_count.fetch_add(1, Ordering::AcqRel);
            Ok(())
        }
    }

    /// Closes the driver.
    ///
    /// The last closer moves the state to `Stop` and physically stops
    /// the peripheral — exactly once regardless of how many openers
    /// there were.
    ///
    /// # Panics
    ///
    /// Panics if the driver is not open; a close without a matching
    /// open is a programming error.
    fn close(&self) {
        let core = self.core();
        let previous = core.open_count.fetch_sub(1, Ordering::AcqRel);
        assert!(previous != 0, "close without a matching open");
        if previous == 1 {
            core.set_state(DriverState::Stop);
            self.stop();
            trace_lifecycle(core, "stopped");
        }
    }

    /// Reconfigures an open driver, returning the hook's status
    /// verbatim.
    ///
    /// # Panics
    ///
    /// Panics if the driver is not open.
    fn configure(&self, config: &dyn Any) -> Result<(), HalError> {
        assert!(
            self.core().open_count() > 0,
            "configure on a driver that is not open"
        );
        self.apply_config(config)
    }
}

fn trace_lifecycle(core: &DriverCore, what: &str) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "registry")] {
            log::trace!("driver {} {}", core.id(), what);
        } else {
            let _ = core;
            log::trace!("driver {}", what);
        }
    }
}
