//! Byte-oriented sequential stream contract.

use super::object::Object;

/// Failure modes of blocking stream operations.
///
/// Success is the `Ok` arm of the surrounding `Result`; together with
/// these two variants it forms the uniform status domain of every
/// blocking stream and channel operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamError {
    /// The allotted time expired before the operation could complete.
    Timeout,
    /// The underlying queue or device was reset while waiting.
    Reset,
}

/// Abstract byte-oriented stream.
///
/// The contract every byte-exchanging object satisfies, independent
/// of the peripheral behind it. Buffer transfers are best-effort: a
/// short count signals an end-of-stream or reset condition, not an
/// error. The single-byte operations block the calling thread until
/// data or space is available and report their outcome as a status.
pub trait SequentialStream: Object {
    /// Writes from `buf`, blocking while the stream cannot accept
    /// data. Returns the number of bytes transferred.
    fn write(&self, buf: &[u8]) -> usize;

    /// Reads into `buf`, blocking while no data is available.
    /// Returns the number of bytes transferred.
    fn read(&self, buf: &mut [u8]) -> usize;

    /// Writes one byte, blocking until the stream accepts it.
    fn put(&self, byte: u8) -> Result<(), StreamError>;

    /// Reads one byte, blocking until one is available.
    fn get(&self) -> Result<u8, StreamError>;
}
