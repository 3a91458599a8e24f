//! Client builder
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use gwlink_client::GatewayClientBuilder;
//! use std::time::Duration;
//!
//! # async fn run() -> gwlink_client::GatewayResult<()> {
//! let client = GatewayClientBuilder::new()
//!     .port(45000)
//!     .sensor_timeout(Duration::from_secs(8))
//!     .build()?;
//! client.connect("192.168.1.50").await?;
//! # Ok(())
//! # }
//! ```

use crate::client::GatewayClient;
use crate::config::GatewayConfig;
use crate::error::GatewayResult;
use gwlink_session::ChecksumPolicy;
use gwlink_transport::{Connector, TcpConnector};
use std::time::Duration;

/// Builder for [`GatewayClient`]
///
/// Starts from [`GatewayConfig::default`]; every setter overrides one field.
/// The configuration is validated by `build`.
#[derive(Debug, Clone, Default)]
pub struct GatewayClientBuilder {
    config: GatewayConfig,
}

impl GatewayClientBuilder {
    /// Create a builder with default settings
    ///
    /// # Default Settings
    /// - Port: 45000
    /// - Connect timeout: 5 s
    /// - Sensor-id timeout: 10 s per attempt
    /// - Firmware timeout: 5 s
    /// - Checksum policy: warn
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration, e.g. one loaded from a file
    pub fn from_config(config: GatewayConfig) -> Self {
        Self { config }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Timeout for each of the two sensor-id attempts
    pub fn sensor_timeout(mut self, timeout: Duration) -> Self {
        self.config.sensor_timeout = timeout;
        self
    }

    pub fn firmware_timeout(mut self, timeout: Duration) -> Self {
        self.config.firmware_timeout = timeout;
        self
    }

    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Bound each socket write; `None` waits indefinitely
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn checksum_policy(mut self, policy: ChecksumPolicy) -> Self {
        self.config.checksum_policy = policy;
        self
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build a TCP client
    ///
    /// # Errors
    /// `InvalidConfig` if validation fails
    pub fn build(self) -> GatewayResult<GatewayClient<TcpConnector>> {
        let connector = match self.config.write_timeout {
            Some(timeout) => TcpConnector::with_write_timeout(timeout),
            None => TcpConnector::new(),
        };
        self.build_with_connector(connector)
    }

    /// Build a client over a custom connector
    pub fn build_with_connector<C: Connector>(self, connector: C) -> GatewayResult<GatewayClient<C>> {
        GatewayClient::with_connector(self.config, connector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GatewayError;

    #[test]
    fn test_builder_overrides() {
        let builder = GatewayClientBuilder::new()
            .port(4000)
            .connect_timeout(Duration::from_secs(2))
            .checksum_policy(ChecksumPolicy::Strict);

        assert_eq!(builder.config().port, 4000);
        assert_eq!(builder.config().connect_timeout, Duration::from_secs(2));
        assert_eq!(builder.config().sensor_timeout, Duration::from_secs(10));

        let client = builder.build().unwrap();
        assert_eq!(client.config().checksum_policy, ChecksumPolicy::Strict);
        assert!(!client.is_connected());
    }

    #[test]
    fn test_build_validates() {
        let result = GatewayClientBuilder::new().sensor_timeout(Duration::ZERO).build();
        assert!(matches!(result, Err(GatewayError::InvalidConfig(_))));
    }
}
