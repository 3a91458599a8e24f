//! Raw command pass-through
//!
//! Rain data, network and live-data commands are framed and exchanged but
//! their payloads are handed back undecoded.

use super::FrameExchange;
use crate::error::GatewayResult;
use crate::status::reject_unsupported;
use gwlink_session::{CommandFrame, ResponseFrame};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct CommandService;

impl CommandService {
    pub fn new() -> Self {
        Self
    }

    /// Send `command` with `payload` and return the raw response frame
    ///
    /// # Errors
    /// `DeviceRejected` when the gateway answers with the unsupported code;
    /// transport and framing errors propagate unchanged.
    pub async fn send<E>(
        &self,
        exchange: &E,
        command: impl Into<u8>,
        payload: &[u8],
        timeout: Duration,
    ) -> GatewayResult<ResponseFrame>
    where
        E: FrameExchange + ?Sized,
    {
        let frame = CommandFrame::new(command, payload)?;
        let sent = frame.command();
        let response = exchange.exchange(frame, timeout).await?;
        reject_unsupported(&response, sent)?;
        Ok(response)
    }
}
