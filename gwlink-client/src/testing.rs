//! In-memory gateway double for connection and client tests

use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use gwlink_session::CommandFrame;
use gwlink_transport::{Connector, IoTransport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

/// What the simulated gateway does with one request
pub(crate) enum Reply {
    /// Write these bytes verbatim
    Raw(Vec<u8>),
    /// Write these bytes after a delay, holding back later requests
    Delayed(Duration, Vec<u8>),
    /// Close the connection without answering
    Close,
}

impl Reply {
    pub(crate) fn frame(command: u8, payload: &[u8]) -> Reply {
        Reply::Raw(CommandFrame::new(command, payload).unwrap().encode())
    }
}

type Responder = dyn Fn(u8, &[u8]) -> Reply + Send + Sync;

/// Connector handing out duplex pipes served by a scripted gateway task
pub(crate) struct ScriptedConnector {
    responder: Arc<Responder>,
    connects: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    /// Host whose connection attempt runs into its timeout
    pub(crate) const STALL: &'static str = "stall";
    /// Host whose connection attempt is refused
    pub(crate) const REFUSED: &'static str = "refused";

    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(u8, &[u8]) -> Reply + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            connects: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn connect_count(&self) -> Arc<AtomicUsize> {
        self.connects.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    type Transport = IoTransport<DuplexStream>;

    async fn connect(
        &self,
        host: &str,
        _port: u16,
        timeout: Duration,
    ) -> GatewayResult<Self::Transport> {
        match host {
            Self::STALL => {
                tokio::time::sleep(timeout).await;
                Err(GatewayError::ConnectionTimeout(timeout))
            }
            Self::REFUSED => Err(GatewayError::ConnectionFailed("connection refused".to_string())),
            _ => {
                self.connects.fetch_add(1, Ordering::SeqCst);
                let (client, device) = tokio::io::duplex(4096);
                tokio::spawn(serve(device, self.responder.clone()));
                Ok(IoTransport::new(client))
            }
        }
    }
}

async fn serve(mut device: DuplexStream, responder: Arc<Responder>) {
    loop {
        let mut header = [0u8; 5];
        if device.read_exact(&mut header).await.is_err() {
            return;
        }
        let length = u16::from_be_bytes([header[3], header[4]]) as usize;
        let mut rest = vec![0u8; length + 1];
        if device.read_exact(&mut rest).await.is_err() {
            return;
        }

        let bytes = match responder(header[2], &rest[..length]) {
            Reply::Raw(bytes) => bytes,
            Reply::Delayed(delay, bytes) => {
                tokio::time::sleep(delay).await;
                bytes
            }
            Reply::Close => return,
        };
        if device.write_all(&bytes).await.is_err() {
            return;
        }
    }
}
