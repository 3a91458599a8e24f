//! Transport establishment

use crate::error::GatewayResult;
use crate::stream::TransportLayer;
use crate::tcp::{TcpSettings, TcpTransport};
use async_trait::async_trait;
use std::time::Duration;

/// Factory for opened transports
///
/// The connection manager asks its connector for a fresh, already-open
/// transport on every `connect`; it never reuses a transport.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: TransportLayer + 'static;

    /// Open a transport to `host:port`
    ///
    /// # Errors
    /// `ConnectionFailed` when the peer cannot be reached,
    /// `ConnectionTimeout` when `timeout` elapses first
    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> GatewayResult<Self::Transport>;
}

/// Connector producing [`TcpTransport`]s
#[derive(Debug, Clone, Default)]
pub struct TcpConnector {
    write_timeout: Option<Duration>,
}

impl TcpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every write on transports produced by this connector
    pub fn with_write_timeout(write_timeout: Duration) -> Self {
        Self {
            write_timeout: Some(write_timeout),
        }
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Transport = TcpTransport;

    async fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> GatewayResult<TcpTransport> {
        let mut settings = TcpSettings::with_timeout(host, port, timeout);
        if self.write_timeout.is_some() {
            settings.write_timeout = self.write_timeout;
        }
        log::debug!("Opening TCP connection to {}", settings.endpoint());

        let mut transport = TcpTransport::new(settings);
        transport.open().await?;
        Ok(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;
    use crate::stream::StreamAccessor;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_opens_transport() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let connector = TcpConnector::with_write_timeout(Duration::from_secs(1));
        let mut transport = connector
            .connect("127.0.0.1", port, Duration::from_secs(2))
            .await
            .unwrap();
        assert!(!transport.is_closed());
        assert_eq!(transport.settings().write_timeout, Some(Duration::from_secs(1)));
        transport.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to obtain a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let result = TcpConnector::new()
            .connect("127.0.0.1", port, Duration::from_secs(2))
            .await;
        assert!(matches!(result, Err(GatewayError::ConnectionFailed(_))));
    }
}
