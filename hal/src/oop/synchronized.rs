//! Reference-counted object with an embedded mutex.

use common::sync::{SpinLock, SpinLockGuard};

use super::referenced::RefCounter;

/// Embeddable base for objects needing caller-driven critical
/// sections.
///
/// Combines the reference counter with a mutex owned by the object
/// instance — the mutex belongs to the object, not to any locker.
/// Derived types embed one, delegate their
/// [`ReferencedObject::references`] accessor to it, and route their
/// finalizer through [`dispose_check`].
///
/// [`ReferencedObject::references`]: super::referenced::ReferencedObject::references
/// [`dispose_check`]: SynchronizedObject::dispose_check
pub struct SynchronizedObject {
    references: RefCounter,
    mutex: SpinLock<()>,
}

impl SynchronizedObject {
    /// Creates the base with one reference and an unlocked mutex.
    pub const fn new() -> Self {
        Self {
            references: RefCounter::new(),
            mutex: SpinLock::new(()),
        }
    }

    /// The embedded reference counter.
    pub fn references(&self) -> &RefCounter {
        &self.references
    }

    /// Enters a critical section on the object.
    ///
    /// The section ends when the guard drops. The mutex is not
    /// re-entrant; locking recursively deadlocks.
    pub fn lock(&self) -> SpinLockGuard<'_, ()> {
        self.mutex.lock()
    }

    /// Finalization helper for derived disposers.
    ///
    /// The mutex itself has no teardown.
    ///
    /// # Panics
    ///
    /// Panics unless the reference count is exactly zero.
    pub fn dispose_check(&self) {
        assert!(
            self.references.count() == 0,
            "disposed with outstanding references"
        );
    }
}

impl Default for SynchronizedObject {
    fn default() -> Self {
        Self::new()
    }
}
