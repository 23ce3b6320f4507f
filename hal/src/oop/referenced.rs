//! Reference counting and the dispose-at-zero protocol.

use core::sync::atomic::{AtomicU32, Ordering, fence};

use super::object::Object;

/// Embeddable reference counter.
///
/// Constructed at 1: the constructing caller owns the first
/// reference. Counting is atomic, so references may be added and
/// released from different threads without an external lock; the
/// count observed by [`count`] is still only a snapshot.
///
/// [`count`]: RefCounter::count
pub struct RefCounter {
    references: AtomicU32,
}

impl RefCounter {
    pub const fn new() -> Self {
        Self {
            references: AtomicU32::new(1),
        }
    }

    /// Unsynchronized snapshot of the current count.
    pub fn count(&self) -> u32 {
        self.references.load(Ordering::Relaxed)
    }

    /// Adds one reference.
    ///
    /// # Panics
    ///
    /// Panics if the counter would wrap. Exhausting the counter is a
    /// programming error, not a recoverable condition.
    pub fn add(&self) {
        let previous = self.references.fetch_add(1, Ordering::Relaxed);
        assert!(previous != u32::MAX, "reference counter overflow");
    }

    /// Drops one reference, returning the number remaining.
    ///
    /// When the result is zero, all prior accesses to the object are
    /// ordered before the caller's subsequent disposal.
    ///
    /// # Panics
    ///
    /// Panics if the count is already zero (a release without a
    /// matching reference — the use-after-free guard).
    pub fn remove(&self) -> u32 {
        let previous = self.references.fetch_sub(1, Ordering::Release);
        assert!(previous != 0, "release with zero references");
        let remaining = previous - 1;
        if remaining == 0 {
            fence(Ordering::Acquire);
        }
        remaining
    }
}

impl Default for RefCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Objects whose lifetime is governed by a reference count.
///
/// The counting logic lives here as provided methods so every derived
/// type shares it exactly; only [`Object::dispose`] varies per type.
/// Any number of holders may share references — the object is
/// destroyed by whichever call brings the count to zero, and no
/// holder may use it afterward.
pub trait ReferencedObject: Object {
    /// The embedded reference counter.
    fn references(&self) -> &RefCounter;

    /// Takes an additional reference to the object and returns it.
    ///
    /// On a trait object, use `references().add()` — returning the
    /// new reference requires the concrete type.
    ///
    /// # Panics
    ///
    /// Panics if the counter would wrap.
    fn add_reference(&self) -> &Self
    where
        Self: Sized,
    {
        self.references().add();
        self
    }

    /// Releases one reference, returning the number remaining.
    ///
    /// When the result is zero the object is disposed exactly once,
    /// synchronously, in the releasing caller's thread of control.
    ///
    /// # Panics
    ///
    /// Panics if no references are outstanding.
    fn release(&self) -> u32 {
        let remaining = self.references().remove();
        if remaining == 0 {
            self.dispose();
        }
        remaining
    }

    /// Unsynchronized snapshot of the reference count.
    fn reference_count(&self) -> u32 {
        self.references().count()
    }
}
