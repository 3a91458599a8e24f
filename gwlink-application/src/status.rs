//! Classification of the command byte echoed in a response

use crate::error::{GatewayError, GatewayResult};
use gwlink_core::DEVICE_ERROR_UNSUPPORTED;
use gwlink_session::ResponseFrame;

/// How a response's command byte relates to the request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// The request's command byte was echoed
    Echo,
    /// The gateway answered with its "unsupported command" code
    Unsupported,
    /// Some other command byte
    Unexpected(u8),
}

impl ResponseStatus {
    pub fn classify(response: &ResponseFrame, sent: u8) -> Self {
        match response.command() {
            received if received == sent => ResponseStatus::Echo,
            DEVICE_ERROR_UNSUPPORTED => ResponseStatus::Unsupported,
            received => ResponseStatus::Unexpected(received),
        }
    }
}

/// Fail with `DeviceRejected` if the gateway refused the command
pub fn reject_unsupported(response: &ResponseFrame, sent: u8) -> GatewayResult<()> {
    match ResponseStatus::classify(response, sent) {
        ResponseStatus::Unsupported => Err(GatewayError::DeviceRejected { command: sent }),
        _ => Ok(()),
    }
}

/// Require the response to echo the command that was sent
pub fn require_echo(response: &ResponseFrame, sent: u8) -> GatewayResult<()> {
    match ResponseStatus::classify(response, sent) {
        ResponseStatus::Echo => Ok(()),
        ResponseStatus::Unsupported => Err(GatewayError::DeviceRejected { command: sent }),
        ResponseStatus::Unexpected(received) => Err(GatewayError::UnexpectedCommand {
            expected: sent,
            received,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(command: u8) -> ResponseFrame {
        ResponseFrame::parse(&[0xFF, 0xFF, command, 0x00, 0x00, command]).unwrap()
    }

    #[test]
    fn test_classify() {
        assert_eq!(ResponseStatus::classify(&response(0x3D), 0x3D), ResponseStatus::Echo);
        assert_eq!(ResponseStatus::classify(&response(0x5B), 0x3D), ResponseStatus::Unsupported);
        assert_eq!(
            ResponseStatus::classify(&response(0x27), 0x3C),
            ResponseStatus::Unexpected(0x27)
        );
    }

    #[test]
    fn test_reject_unsupported() {
        assert!(reject_unsupported(&response(0x3D), 0x3D).is_ok());
        assert!(reject_unsupported(&response(0x27), 0x3D).is_ok());
        assert!(matches!(
            reject_unsupported(&response(0x5B), 0x3D),
            Err(GatewayError::DeviceRejected { command: 0x3D })
        ));
    }

    #[test]
    fn test_require_echo() {
        assert!(require_echo(&response(0x3C), 0x3C).is_ok());
        assert!(matches!(
            require_echo(&response(0x3D), 0x3C),
            Err(GatewayError::UnexpectedCommand { expected: 0x3C, received: 0x3D })
        ));
        assert!(matches!(
            require_echo(&response(0x5B), 0x3C),
            Err(GatewayError::DeviceRejected { command: 0x3C })
        ));
    }
}
