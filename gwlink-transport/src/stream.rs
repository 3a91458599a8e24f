//! Stream accessor trait for transport layer

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;

/// Stream accessor interface to access a physical stream to a gateway
#[async_trait]
pub trait StreamAccessor: Send {
    /// Read whatever data is currently available from the stream
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to read into
    ///
    /// # Returns
    ///
    /// Number of bytes read, or 0 if the remote closed the stream
    ///
    /// Implementations must be cancel-safe: dropping the returned future
    /// before it completes must not lose bytes.
    async fn read(&mut self, buf: &mut [u8]) -> GatewayResult<usize>;

    /// Write data to the stream
    ///
    /// # Returns
    ///
    /// Number of bytes written
    async fn write(&mut self, buf: &[u8]) -> GatewayResult<usize>;

    /// Write all data to the stream
    async fn write_all(&mut self, buf: &[u8]) -> GatewayResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(GatewayError::Connection(std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    "Failed to write all data",
                )));
            }
            written += n;
        }
        Ok(())
    }

    /// Flush any buffered data
    async fn flush(&mut self) -> GatewayResult<()>;

    /// Check if the stream is closed
    fn is_closed(&self) -> bool;

    /// Close the stream
    async fn close(&mut self) -> GatewayResult<()>;
}

/// Transport layer trait that extends StreamAccessor
#[async_trait]
pub trait TransportLayer: StreamAccessor {
    /// Open the physical layer connection
    async fn open(&mut self) -> GatewayResult<()>;
}
