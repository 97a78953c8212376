use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

/// Common trait for byte-oriented endpoints
///
/// An endpoint is an opened channel (a serial port, or an in-memory double
/// in tests). The forwarder reads from one endpoint on one task and writes
/// to it from another, so the read path and the write path must be safe to
/// use concurrently with each other. Concurrent reads with reads, or writes
/// with writes, never happen and need not be supported.
///
/// Once `close` has been called every other operation fails with
/// `RelayError::Connection`.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Device path or name the endpoint was opened with
    fn identifier(&self) -> &str;

    /// Baud rate the endpoint was opened with
    fn baud_rate(&self) -> u32;

    fn is_closed(&self) -> bool;

    /// Number of bytes buffered for reading. Never blocks.
    fn available_bytes(&self) -> Result<usize>;

    /// Reads exactly the bytes buffered at the time of the call
    ///
    /// Returns an empty payload when nothing is buffered and never waits
    /// for more data to arrive.
    async fn read_available(&self) -> Result<Bytes>;

    /// Writes the whole payload
    ///
    /// Blocks only as long as the transport needs to accept the data. A
    /// partial write is reported as an error.
    async fn write(&self, data: &[u8]) -> Result<()>;

    /// Releases the underlying resource. Idempotent.
    ///
    /// An in-flight write fails with a connection error instead of hanging.
    fn close(&self) -> Result<()>;
}

impl fmt::Debug for dyn Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("identifier", &self.identifier())
            .field("baud_rate", &self.baud_rate())
            .field("closed", &self.is_closed())
            .finish()
    }
}
