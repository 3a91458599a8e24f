//! Application layer for the weather-station gateway protocol
//!
//! This crate decodes response payloads and implements the request policies
//! on top of the framing layer:
//!
//! - sensor inventory, with the legacy → new command fallback
//! - firmware version
//! - raw pass-through for commands whose payloads are not decoded here

pub mod error;
pub mod payload;
pub mod service;
pub mod status;

pub use error::{GatewayError, GatewayResult};
pub use payload::{decode_firmware_version, decode_sensor_table};
pub use service::{CommandService, FirmwareService, FrameExchange, SensorInfoService};
pub use status::{reject_unsupported, require_echo, ResponseStatus};
