//! Transport over an arbitrary tokio byte stream

use crate::error::{GatewayError, GatewayResult};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Transport wrapping an already-connected stream
///
/// Used for in-memory pipes (`tokio::io::duplex`) and for sockets that were
/// connected outside of [`crate::TcpTransport`].
#[derive(Debug)]
pub struct IoTransport<T> {
    io: Option<T>,
    closed: bool,
}

impl<T> IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a connected stream; the transport starts open
    pub fn new(io: T) -> Self {
        Self {
            io: Some(io),
            closed: false,
        }
    }

    fn io_mut(&mut self) -> GatewayResult<&mut T> {
        self.io.as_mut().ok_or_else(|| {
            GatewayError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Stream already closed",
            ))
        })
    }
}

#[async_trait]
impl<T> TransportLayer for IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn open(&mut self) -> GatewayResult<()> {
        if self.io.is_none() {
            return Err(GatewayError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Wrapped stream cannot be reopened",
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<T> StreamAccessor for IoTransport<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read(&mut self, buf: &mut [u8]) -> GatewayResult<usize> {
        let result = self.io_mut()?.read(buf).await.map_err(GatewayError::Connection);
        if matches!(result, Ok(0) | Err(_)) {
            self.closed = true;
        }
        result
    }

    async fn write(&mut self, buf: &[u8]) -> GatewayResult<usize> {
        self.io_mut()?.write(buf).await.map_err(GatewayError::Connection)
    }

    async fn flush(&mut self) -> GatewayResult<()> {
        self.io_mut()?.flush().await.map_err(GatewayError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> GatewayResult<()> {
        if let Some(mut io) = self.io.take() {
            let _ = io.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}
