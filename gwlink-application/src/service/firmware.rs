//! Firmware version request

use super::FrameExchange;
use crate::error::GatewayResult;
use crate::payload::decode_firmware_version;
use crate::status::reject_unsupported;
use gwlink_core::CommandCode;
use gwlink_session::CommandFrame;
use std::time::Duration;

/// Reads the gateway firmware version string
#[derive(Debug, Clone)]
pub struct FirmwareService {
    timeout: Duration,
}

impl FirmwareService {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn read<E>(&self, exchange: &E) -> GatewayResult<String>
    where
        E: FrameExchange + ?Sized,
    {
        let command = CommandCode::ReadFirmware;
        let response = exchange
            .exchange(CommandFrame::new(command, &[])?, self.timeout)
            .await?;
        reject_unsupported(&response, command.code())?;

        let version = decode_firmware_version(response.as_bytes())?;
        log::debug!("Gateway firmware version {}", version);
        Ok(version)
    }
}
