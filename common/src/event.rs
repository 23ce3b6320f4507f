//! Interrupt-safe condition-flag broadcasting.
//!
//! An [`EventSource`] fans a bitmask of condition flags out to any
//! number of registered [`EventListener`]s. The producer side,
//! [`EventSource::broadcast`], never blocks and never takes a lock, so
//! it is safe to call from an interrupt handler while application
//! threads hold unrelated locks. Consumers poll or wait on their
//! listener through the kernel's scheduling primitives, which are
//! outside this crate; here a listener is only an accumulator of
//! pending flags.

use core::ptr;
use core::sync::atomic::{AtomicBool, AtomicPtr, AtomicU32, Ordering};

/// Bitmask of broadcast condition flags.
///
/// The meaning of individual bits is defined by the broadcaster.
pub type EventFlags = u32;

/// Receiver side of an [`EventSource`].
///
/// Listener nodes are linked into the source's intrusive list, so they
/// must live for the rest of the program (`'static`). A node may be
/// registered with at most one source over its lifetime; it can be
/// deactivated and re-activated on that source freely.
pub struct EventListener {
    flags: AtomicU32,
    active: AtomicBool,
    linked: AtomicBool,
    next: AtomicPtr<EventListener>,
}

impl EventListener {
    /// Creates an unregistered listener with no pending flags.
    pub const fn new() -> Self {
        Self {
            flags: AtomicU32::new(0),
            active: AtomicBool::new(false),
            linked: AtomicBool::new(false),
            next: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Pending flags accumulated since the last [`take_flags`].
    ///
    /// [`take_flags`]: EventListener::take_flags
    pub fn flags(&self) -> EventFlags {
        self.flags.load(Ordering::Acquire)
    }

    /// Returns the pending flags and clears them in one step.
    pub fn take_flags(&self) -> EventFlags {
        self.flags.swap(0, Ordering::AcqRel)
    }
}

impl Default for EventListener {
    fn default() -> Self {
        Self::new()
    }
}

/// Broadcast source for condition flags.
///
/// Typically embedded in an asynchronous channel and signaled from the
/// channel's service path when an I/O condition arises.
pub struct EventSource {
    head: AtomicPtr<EventListener>,
}

impl EventSource {
    /// Creates a source with no listeners.
    pub const fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Registers `listener` with this source.
    ///
    /// A node that was previously unregistered from this source is
    /// re-activated in place. Registering a node already linked to a
    /// different source is a contract violation that cannot be
    /// detected here; the node would keep receiving from the source it
    /// was first linked to.
    pub fn register(&self, listener: &'static EventListener) {
        if listener.linked.swap(true, Ordering::AcqRel) {
            // Already in the list, only flip it back on.
            listener.active.store(true, Ordering::Release);
            return;
        }
        listener.active.store(true, Ordering::Relaxed);
        let node = listener as *const EventListener as *mut EventListener;
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            listener.next.store(head, Ordering::Relaxed);
            match self
                .head
                .compare_exchange_weak(head, node, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => break,
                Err(current) => head = current,
            }
        }
    }

    /// Deactivates `listener`; subsequent broadcasts skip it.
    ///
    /// The node stays linked — unlinking would require locking out the
    /// interrupt-context producer — and keeps whatever flags were
    /// already pending.
    pub fn unregister(&self, listener: &EventListener) {
        listener.active.store(false, Ordering::Release);
    }

    /// True if at least one active listener is registered.
    ///
    /// Producers may use this to skip flag computation when nobody is
    /// listening. The answer is a snapshot.
    pub fn is_listening(&self) -> bool {
        let mut node = self.head.load(Ordering::Acquire);
        while let Some(listener) = unsafe { node.as_ref() } {
            if listener.active.load(Ordering::Acquire) {
                return true;
            }
            node = listener.next.load(Ordering::Acquire);
        }
        false
    }

    /// ORs `flags` into the pending mask of every active listener.
    ///
    /// Lock-free and non-blocking; safe to call from interrupt context
    /// regardless of which locks application threads hold.
    pub fn broadcast(&self, flags: EventFlags) {
        // SAFETY: nodes are 'static and never unlinked once pushed, so
        // every pointer reachable from `head` stays valid forever.
        let mut node = self.head.load(Ordering::Acquire);
        while let Some(listener) = unsafe { node.as_ref() } {
            if listener.active.load(Ordering::Acquire) {
                listener.flags.fetch_or(flags, Ordering::AcqRel);
            }
            node = listener.next.load(Ordering::Acquire);
        }
    }
}

impl Default for EventSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak_listener() -> &'static EventListener {
        Box::leak(Box::new(EventListener::new()))
    }

    #[test]
    fn broadcast_reaches_all_registered_listeners() {
        let source = EventSource::new();
        let a = leak_listener();
        let b = leak_listener();
        source.register(a);
        source.register(b);

        source.broadcast(0x5);
        source.broadcast(0x2);

        assert_eq!(a.take_flags(), 0x7);
        assert_eq!(b.take_flags(), 0x7);
        assert_eq!(a.flags(), 0);
    }

    #[test]
    fn broadcast_with_no_listeners_is_a_no_op() {
        let source = EventSource::new();
        assert!(!source.is_listening());
        source.broadcast(0xffff_ffff);
    }

    #[test]
    fn unregistered_listener_is_skipped() {
        let source = EventSource::new();
        let listener = leak_listener();
        source.register(listener);
        source.broadcast(0x1);
        source.unregister(listener);
        source.broadcast(0x2);
        assert_eq!(listener.take_flags(), 0x1);
        assert!(!source.is_listening());
    }

    #[test]
    fn reregistration_reactivates_in_place() {
        let source = EventSource::new();
        let listener = leak_listener();
        source.register(listener);
        source.unregister(listener);
        source.register(listener);
        source.broadcast(0x8);
        assert_eq!(listener.take_flags(), 0x8);
        assert!(source.is_listening());
    }

    #[test]
    fn take_flags_clears_atomically() {
        let source = EventSource::new();
        let listener = leak_listener();
        source.register(listener);
        source.broadcast(0x10);
        assert_eq!(listener.take_flags(), 0x10);
        assert_eq!(listener.take_flags(), 0);
    }
}
