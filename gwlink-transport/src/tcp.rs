//! TCP transport implementation

use crate::error::{GatewayError, GatewayResult};
use crate::stream::{StreamAccessor, TransportLayer};
use async_trait::async_trait;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Default TCP port of the gateway's local API
pub const DEFAULT_PORT: u16 = 45000;

/// Wrapper for TcpStream that implements Debug
struct DebugTcpStream(TcpStream);

impl fmt::Debug for DebugTcpStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TcpStream").finish()
    }
}

impl Deref for DebugTcpStream {
    type Target = TcpStream;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DebugTcpStream {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// TCP transport layer settings
#[derive(Debug, Clone)]
pub struct TcpSettings {
    /// Hostname or IP address of the gateway
    pub host: String,
    pub port: u16,
    /// Upper bound on connection establishment
    pub connect_timeout: Duration,
    /// Upper bound on a single write. Reads are bounded by the framing layer's
    /// per-command deadline instead.
    pub write_timeout: Option<Duration>,
}

impl TcpSettings {
    /// Create new TCP settings
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(5),
            write_timeout: Some(Duration::from_secs(5)),
        }
    }

    /// Create TCP settings with connect timeout
    pub fn with_timeout(host: impl Into<String>, port: u16, connect_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            ..Self::new(host, port)
        }
    }

    /// `host:port` form used in log lines
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// TCP transport layer implementation
#[derive(Debug)]
pub struct TcpTransport {
    stream: Option<DebugTcpStream>,
    settings: TcpSettings,
    closed: bool,
}

impl TcpTransport {
    /// Create a new TCP transport layer
    pub fn new(settings: TcpSettings) -> Self {
        Self {
            stream: None,
            settings,
            closed: true,
        }
    }

    pub fn settings(&self) -> &TcpSettings {
        &self.settings
    }

    fn stream_mut(&mut self) -> GatewayResult<&mut DebugTcpStream> {
        self.stream.as_mut().ok_or_else(|| {
            GatewayError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "TCP stream not connected",
            ))
        })
    }
}

#[async_trait]
impl TransportLayer for TcpTransport {
    async fn open(&mut self) -> GatewayResult<()> {
        if !self.closed {
            return Err(GatewayError::Connection(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Connection has already been opened",
            )));
        }

        let timeout = self.settings.connect_timeout;
        let connect = TcpStream::connect((self.settings.host.as_str(), self.settings.port));
        let stream = tokio::time::timeout(timeout, connect)
            .await
            .map_err(|_| GatewayError::ConnectionTimeout(timeout))?
            .map_err(|e| GatewayError::ConnectionFailed(e.to_string()))?;

        // Command frames are tiny; send them immediately
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("Failed to set TCP_NODELAY on {}: {}", self.settings.endpoint(), e);
        }

        self.stream = Some(DebugTcpStream(stream));
        self.closed = false;
        Ok(())
    }
}

#[async_trait]
impl StreamAccessor for TcpTransport {
    async fn read(&mut self, buf: &mut [u8]) -> GatewayResult<usize> {
        let stream = self.stream_mut()?;
        let result = stream.read(buf).await.map_err(GatewayError::Connection);

        match result {
            Ok(0) => {
                self.closed = true;
                Ok(0)
            }
            Ok(n) => Ok(n),
            Err(e) => {
                self.closed = true;
                Err(e)
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> GatewayResult<usize> {
        let write_timeout = self.settings.write_timeout;
        let stream = self.stream_mut()?;

        if let Some(timeout) = write_timeout {
            tokio::time::timeout(timeout, stream.write(buf))
                .await
                .map_err(|_| {
                    GatewayError::Connection(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "TCP write timed out",
                    ))
                })?
                .map_err(GatewayError::Connection)
        } else {
            stream.write(buf).await.map_err(GatewayError::Connection)
        }
    }

    async fn flush(&mut self) -> GatewayResult<()> {
        let stream = self.stream_mut()?;
        stream.flush().await.map_err(GatewayError::Connection)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn close(&mut self) -> GatewayResult<()> {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.shutdown().await;
        }
        self.closed = true;
        Ok(())
    }
}
