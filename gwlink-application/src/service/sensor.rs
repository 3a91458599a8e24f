//! Sensor inventory request
//!
//! Gateways in the field answer one of two sensor-id commands depending on
//! firmware. The legacy command is tried first; any failure other than an
//! explicit rejection falls back to the newer command exactly once.

use super::FrameExchange;
use crate::error::{GatewayError, GatewayResult};
use crate::payload::decode_sensor_table;
use crate::status::{reject_unsupported, require_echo};
use gwlink_core::{CommandCode, SensorTable};
use gwlink_session::CommandFrame;
use std::time::Duration;

/// Reads the gateway's sensor table
#[derive(Debug, Clone)]
pub struct SensorInfoService {
    timeout: Duration,
}

impl SensorInfoService {
    /// Create a service with a per-attempt response timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Read the sensor table
    ///
    /// # Errors
    /// - `DeviceRejected` if either command is answered with the unsupported
    ///   code; a rejected legacy command is not followed by the fallback
    /// - `SensorInfoUnavailable` if both commands fail for other reasons, or
    ///   the legacy command fails and the connection is no longer ready
    pub async fn read<E>(&self, exchange: &E) -> GatewayResult<SensorTable>
    where
        E: FrameExchange + ?Sized,
    {
        let legacy = match self.attempt(exchange, CommandCode::ReadSensorIdLegacy).await {
            Ok(table) => return Ok(table),
            Err(e) if e.is_device_rejection() => {
                log::info!("Gateway rejected the legacy sensor-id command");
                return Err(e);
            }
            Err(e) => e,
        };

        if !exchange.is_ready() {
            log::warn!("Legacy sensor-id request failed ({}) and the connection is gone", legacy);
            return Err(GatewayError::SensorInfoUnavailable {
                legacy: Box::new(legacy),
                fallback: Box::new(GatewayError::NotConnected),
            });
        }

        log::info!("Legacy sensor-id request failed ({}), retrying with the newer command", legacy);
        match self.attempt(exchange, CommandCode::ReadSensorIdNew).await {
            Ok(table) => Ok(table),
            Err(e) if e.is_device_rejection() => Err(e),
            Err(fallback) => Err(GatewayError::SensorInfoUnavailable {
                legacy: Box::new(legacy),
                fallback: Box::new(fallback),
            }),
        }
    }

    async fn attempt<E>(&self, exchange: &E, command: CommandCode) -> GatewayResult<SensorTable>
    where
        E: FrameExchange + ?Sized,
    {
        let frame = CommandFrame::new(command, &[])?;
        let response = exchange.exchange(frame, self.timeout).await?;

        match command {
            // Legacy responses are loosely specified; only the rejection code is checked
            CommandCode::ReadSensorIdLegacy => reject_unsupported(&response, command.code())?,
            _ => require_echo(&response, command.code())?,
        }

        let table = decode_sensor_table(response.payload())?;
        log::debug!("Decoded {} sensors via {}", table.len(), command);
        Ok(table)
    }
}
