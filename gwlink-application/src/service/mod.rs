//! Request services
//!
//! Each service turns one logical request into one or more framed exchanges
//! and decodes the result. They talk to the connection only through
//! [`FrameExchange`].

pub mod command;
pub mod firmware;
pub mod sensor;

pub use command::CommandService;
pub use firmware::FirmwareService;
pub use sensor::SensorInfoService;

use crate::error::GatewayResult;
use async_trait::async_trait;
use gwlink_session::{CommandFrame, ResponseFrame};
use std::time::Duration;

/// One command/response exchange on a live connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FrameExchange: Send + Sync {
    /// Write `frame` and receive the matching response within `timeout`
    async fn exchange(&self, frame: CommandFrame, timeout: Duration) -> GatewayResult<ResponseFrame>;

    /// Whether the connection can carry another exchange
    fn is_ready(&self) -> bool;
}
