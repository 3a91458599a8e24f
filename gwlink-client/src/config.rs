//! Client configuration
//!
//! Durations are carried as `Duration` in code and as whole milliseconds in
//! serialized form, so a configuration file reads:
//!
//! ```json
//! { "port": 45000, "connect_timeout_ms": 5000, "checksum_policy": "warn" }
//! ```
//!
//! Missing fields take their defaults.

use crate::error::{GatewayError, GatewayResult};
use gwlink_session::ChecksumPolicy;
use gwlink_transport::DEFAULT_PORT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default timeout for establishing the TCP connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default per-attempt timeout for sensor-id requests
pub const DEFAULT_SENSOR_TIMEOUT: Duration = Duration::from_secs(10);
/// Default timeout for the firmware request
pub const DEFAULT_FIRMWARE_TIMEOUT: Duration = Duration::from_secs(5);
/// Default timeout for raw command pass-through
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// TCP port of the gateway's binary API
    pub port: u16,
    #[serde(rename = "connect_timeout_ms", with = "millis")]
    pub connect_timeout: Duration,
    #[serde(rename = "sensor_timeout_ms", with = "millis")]
    pub sensor_timeout: Duration,
    #[serde(rename = "firmware_timeout_ms", with = "millis")]
    pub firmware_timeout: Duration,
    #[serde(rename = "command_timeout_ms", with = "millis")]
    pub command_timeout: Duration,
    /// Bound on a single socket write; `None` waits indefinitely
    #[serde(rename = "write_timeout_ms", with = "optional_millis")]
    pub write_timeout: Option<Duration>,
    pub checksum_policy: ChecksumPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            sensor_timeout: DEFAULT_SENSOR_TIMEOUT,
            firmware_timeout: DEFAULT_FIRMWARE_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            write_timeout: Some(Duration::from_secs(5)),
            checksum_policy: ChecksumPolicy::default(),
        }
    }
}

impl GatewayConfig {
    /// Validate the configuration
    ///
    /// # Errors
    /// `InvalidConfig` if the port is zero or any timeout is zero
    pub fn validate(&self) -> GatewayResult<()> {
        if self.port == 0 {
            return Err(GatewayError::InvalidConfig("port must be non-zero".to_string()));
        }

        let timeouts = [
            ("connect_timeout", Some(self.connect_timeout)),
            ("sensor_timeout", Some(self.sensor_timeout)),
            ("firmware_timeout", Some(self.firmware_timeout)),
            ("command_timeout", Some(self.command_timeout)),
            ("write_timeout", self.write_timeout),
        ];
        for (name, timeout) in timeouts {
            if timeout.is_some_and(|t| t.is_zero()) {
                return Err(GatewayError::InvalidConfig(format!("{} must be non-zero", name)));
            }
        }
        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod optional_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}
