//! Object-model base types.
//!
//! The root of the type hierarchy every other abstraction extends:
//! plain objects, reference-counted objects, mutex-carrying
//! synchronized objects, and the byte-stream contract.

pub mod object;
pub mod referenced;
pub mod stream;
pub mod synchronized;

pub use object::Object;
pub use referenced::{RefCounter, ReferencedObject};
pub use stream::{SequentialStream, StreamError};
pub use synchronized::SynchronizedObject;
