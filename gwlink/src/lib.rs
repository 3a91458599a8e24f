//! gwlink - client for the weather-station gateway binary protocol
//!
//! Ecowitt-family gateways answer framed binary requests on TCP port 45000.
//! This library connects to a gateway, reads its sensor table and firmware
//! version, and passes arbitrary commands through.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `gwlink-core`: Error taxonomy, command codes, sensor model
//! - `gwlink-transport`: Stream abstraction, TCP transport, connectors
//! - `gwlink-session`: Frame building, response assembly, framed session
//! - `gwlink-application`: Payload decoders and request services
//! - `gwlink-client`: Connection manager, configuration, client API
//!
//! # Usage
//!
//! ```no_run
//! use gwlink::client::GatewayClientBuilder;
//!
//! # async fn run() -> gwlink::GatewayResult<()> {
//! let client = GatewayClientBuilder::new().build()?;
//! client.connect("192.168.1.50").await?;
//!
//! let version = client.read_firmware_version().await?;
//! for sensor in client.read_sensor_info().await?.registered() {
//!     println!("{} {:08X} {}", sensor.kind().name(), sensor.sensor_id, sensor.signal().as_str());
//! }
//! println!("firmware {}", version);
//! # Ok(())
//! # }
//! ```

// Re-export core types
pub use gwlink_core::{
    BatteryLevel, CommandCode, ErrorKind, GatewayError, GatewayResult, Registration,
    SensorModel, SensorRecord, SensorTable, SensorType, SignalLevel, Truncation,
    DEVICE_ERROR_UNSUPPORTED,
};

// Re-export client API
pub mod client {
    pub use gwlink_client::*;
}

// Re-export framing layer
pub mod session {
    pub use gwlink_session::*;
}

// Re-export transports
pub mod transport {
    pub use gwlink_transport::*;
}

// Re-export decoders and services
pub mod application {
    pub use gwlink_application::*;
}

pub use gwlink_client::{GatewayClient, GatewayClientBuilder, GatewayConfig};
