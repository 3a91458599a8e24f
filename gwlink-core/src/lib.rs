//! Core types for the weather-station gateway protocol
//!
//! This crate provides the error taxonomy, the command codes that form the
//! wire contract, and the sensor inventory model shared by every other crate
//! in the workspace.

pub mod command;
pub mod error;
pub mod sensor;

pub use command::{CommandCode, DEVICE_ERROR_UNSUPPORTED};
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use sensor::{
    BatteryLevel, Registration, SensorModel, SensorRecord, SensorTable, SensorType, SignalLevel,
    Truncation,
};
