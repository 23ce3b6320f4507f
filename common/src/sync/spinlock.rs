use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, Ordering};

/// Busy-wait mutual exclusion primitive.
///
/// This is the mutex the object framework embeds in synchronized
/// objects and driver instances: acquisition spins until the lock is
/// free, so it is usable where blocking on a scheduler is not.
/// Lock/unlock pairing is enforced by the returned guard.
///
/// Not fair. Not re-entrant: locking recursively deadlocks.
pub struct SpinLock<T> {
    locked: AtomicBool,
    data: UnsafeCell<T>,
}

// SAFETY: the lock serializes all access to the inner data, so sharing
// the lock between threads is sound whenever the data itself is Send.
unsafe impl<T: Send> Sync for SpinLock<T> {}
unsafe impl<T: Send> Send for SpinLock<T> {}

impl<T> SpinLock<T> {
    /// Creates an unlocked instance wrapping `data`.
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            data: UnsafeCell::new(data),
        }
    }

    /// Acquires the lock, spinning until it becomes available.
    ///
    /// The lock is released when the guard is dropped.
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        while self.try_acquire().is_err() {
            core::hint::spin_loop();
        }
        SpinLockGuard { lock: self }
    }

    /// Attempts to acquire the lock without spinning.
    ///
    /// Returns `None` if the lock is currently held. Used by polled
    /// blocking loops that must give up the CPU between probes instead
    /// of contending for the lock.
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        match self.try_acquire() {
            Ok(()) => Some(SpinLockGuard { lock: self }),
            Err(()) => None,
        }
    }

    fn try_acquire(&self) -> Result<(), ()> {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| ())
            .map_err(|_| ())
    }
}

/// Provides access to the data protected by a [`SpinLock`].
///
/// The lock is released when the guard goes out of scope.
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> core::ops::Deref for SpinLockGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the lock is held for the guard's lifetime
        unsafe { &*self.lock.data.get() }
    }
}

impl<T> core::ops::DerefMut for SpinLockGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the lock is held for the guard's lifetime
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.locked.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn guard_gives_mutable_access() {
        let lock = SpinLock::new(5u32);
        {
            let mut guard = lock.lock();
            *guard += 1;
        }
        assert_eq!(*lock.lock(), 6);
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = SpinLock::new(());
        let guard = lock.lock();
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn contended_increments_are_serialized() {
        let lock = Arc::new(SpinLock::new(0u64));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let lock = Arc::clone(&lock);
            handles.push(thread::spawn(move || {
                for _ in 0..10_000 {
                    *lock.lock() += 1;
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), 40_000);
    }
}
