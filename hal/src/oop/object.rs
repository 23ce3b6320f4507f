//! Root of the object hierarchy.
//!
//! Identity and dispatch for the polymorphic types of the framework.
//! The dispatch table of an abstract type is the trait itself: a
//! `&dyn` reference carries the vtable, and a concrete driver gains a
//! base type by embedding its state block, never by memory-layout
//! aliasing. The trait is attached at construction and never changes
//! for the object's lifetime — there is no re-typing.

/// Base trait of every framework object.
///
/// Carries no data. Construction is ordinary value construction,
/// performed single-threaded before the object is published; there
/// are no error conditions. The only operation is the finalization
/// hook used by the reference-counting layer.
pub trait Object {
    /// Finalization hook.
    ///
    /// Invoked exactly once, synchronously, when the last reference
    /// to the object is released. The default performs no observable
    /// side effect; derived types override it to tear down their own
    /// resources. Never call it directly — disposal is driven by
    /// [`ReferencedObject::release`].
    ///
    /// [`ReferencedObject::release`]: super::referenced::ReferencedObject::release
    fn dispose(&self) {}
}
