//! Gateway client
//!
//! The request API used by the presentation layer. Each call is one logical
//! request on the managed connection; failures are also recorded as the
//! connection's last error message.

use crate::config::GatewayConfig;
use crate::connection::{ConnectionManager, ConnectionState, ConnectionStatus};
use crate::error::GatewayResult;
use gwlink_application::{CommandService, FirmwareService, SensorInfoService};
use gwlink_core::SensorTable;
use gwlink_session::{ResponseFrame, SessionStatistics};
use gwlink_transport::{Connector, TcpConnector};
use std::time::Duration;
use tokio::sync::watch;

/// Weather-station gateway client
pub struct GatewayClient<C: Connector = TcpConnector> {
    config: GatewayConfig,
    manager: ConnectionManager<C>,
    sensors: SensorInfoService,
    firmware: FirmwareService,
    commands: CommandService,
}

impl GatewayClient<TcpConnector> {
    /// Create a TCP client from `config`
    ///
    /// # Errors
    /// `InvalidConfig` if validation fails
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let connector = match config.write_timeout {
            Some(timeout) => TcpConnector::with_write_timeout(timeout),
            None => TcpConnector::new(),
        };
        Self::with_connector(config, connector)
    }
}

impl<C: Connector> GatewayClient<C> {
    /// Create a client that opens transports through `connector`
    pub fn with_connector(config: GatewayConfig, connector: C) -> GatewayResult<Self> {
        config.validate()?;
        Ok(Self {
            manager: ConnectionManager::new(connector, config.checksum_policy),
            sensors: SensorInfoService::new(config.sensor_timeout),
            firmware: FirmwareService::new(config.firmware_timeout),
            commands: CommandService::new(),
            config,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Connect to `host` on the configured port with the configured timeout
    pub async fn connect(&self, host: &str) -> GatewayResult<()> {
        self.manager
            .connect(host, self.config.port, self.config.connect_timeout)
            .await
    }

    /// Connect to `host:port` with an explicit timeout
    pub async fn connect_to(&self, host: &str, port: u16, timeout: Duration) -> GatewayResult<()> {
        self.manager.connect(host, port, timeout).await
    }

    pub async fn disconnect(&self) {
        self.manager.disconnect().await
    }

    /// Read the gateway's sensor table
    ///
    /// Tries the legacy sensor-id command first and falls back to the newer
    /// one once, unless the gateway explicitly rejects the legacy command.
    pub async fn read_sensor_info(&self) -> GatewayResult<SensorTable> {
        let result = self.sensors.read(&self.manager).await;
        self.record(result)
    }

    /// Read the gateway firmware version string
    pub async fn read_firmware_version(&self) -> GatewayResult<String> {
        let result = self.firmware.read(&self.manager).await;
        self.record(result)
    }

    /// Send an arbitrary command and return the raw response frame
    pub async fn send_command(
        &self,
        command: impl Into<u8>,
        payload: &[u8],
    ) -> GatewayResult<ResponseFrame> {
        let result = self
            .commands
            .send(&self.manager, command, payload, self.config.command_timeout)
            .await;
        self.record(result)
    }

    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.manager.state()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    /// Subscribe to connection status changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.manager.subscribe()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.manager.last_error_message()
    }

    pub fn endpoint(&self) -> Option<String> {
        self.manager.endpoint()
    }

    pub async fn statistics(&self) -> Option<SessionStatistics> {
        self.manager.statistics().await
    }

    fn record<T>(&self, result: GatewayResult<T>) -> GatewayResult<T> {
        if let Err(e) = &result {
            log::warn!("Gateway request failed: {}", e);
            self.manager.record_error(e);
        }
        result
    }
}
