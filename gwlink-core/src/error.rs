use std::time::Duration;
use thiserror::Error;

/// Main error type for gateway protocol operations
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection error: {0}")]
    Connection(#[from] std::io::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection attempt timed out after {0:?}")]
    ConnectionTimeout(Duration),

    #[error("Connection attempt cancelled")]
    Cancelled,

    #[error("Not connected to a gateway")]
    NotConnected,

    #[error("Invalid frame header: expected FF FF, received {0:02X} {1:02X}")]
    InvalidHeader(u8, u8),

    #[error("Checksum mismatch: frame carries 0x{received:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch { received: u8, computed: u8 },

    #[error("Stream closed before the frame header was complete ({received} bytes received)")]
    IncompleteHeader { received: usize },

    #[error("Stream closed after {received} of {expected} frame bytes")]
    PrematureClose { received: usize, expected: usize },

    #[error("Timed out waiting for response ({received} bytes received)")]
    Timeout { received: usize },

    #[error("Gateway rejected command 0x{command:02X} as unsupported")]
    DeviceRejected { command: u8 },

    #[error("Unexpected response command 0x{received:02X} to request 0x{expected:02X}")]
    UnexpectedCommand { expected: u8, received: u8 },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error(
        "Sensor information unavailable, gateway firmware may not support sensor listing \
         (legacy request: {legacy}; fallback request: {fallback})"
    )]
    SensorInfoUnavailable {
        legacy: Box<GatewayError>,
        fallback: Box<GatewayError>,
    },

    #[error("Payload of {0} bytes exceeds the 16-bit length field")]
    PayloadTooLarge(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of [`GatewayError`] values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Socket-level failure or timeout while establishing or using the connection
    Transport,
    /// The stream is not speaking this protocol
    Framing,
    /// The stream ended before a full frame arrived
    IncompleteResponse,
    /// The gateway answered with its "unsupported command" code
    DeviceRejected,
    /// Well-framed response whose payload failed structural decoding
    Decode,
    /// Both sensor-id command variants failed
    Unavailable,
    /// Caller-side misuse (bad configuration, oversized payload)
    Usage,
}

impl GatewayError {
    /// Taxonomy bucket for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Connection(_)
            | GatewayError::ConnectionFailed(_)
            | GatewayError::ConnectionTimeout(_)
            | GatewayError::Cancelled
            | GatewayError::NotConnected
            | GatewayError::Timeout { .. } => ErrorKind::Transport,
            GatewayError::InvalidHeader(..)
            | GatewayError::ChecksumMismatch { .. }
            | GatewayError::UnexpectedCommand { .. } => ErrorKind::Framing,
            GatewayError::IncompleteHeader { .. } | GatewayError::PrematureClose { .. } => {
                ErrorKind::IncompleteResponse
            }
            GatewayError::DeviceRejected { .. } => ErrorKind::DeviceRejected,
            GatewayError::Decode(_) => ErrorKind::Decode,
            GatewayError::SensorInfoUnavailable { .. } => ErrorKind::Unavailable,
            GatewayError::PayloadTooLarge(_) | GatewayError::InvalidConfig(_) => ErrorKind::Usage,
        }
    }

    /// Human-readable explanation suitable for presenting to an end user
    ///
    /// Unlike the `Display` output this never contains raw byte values.
    pub fn explanation(&self) -> &'static str {
        match self {
            GatewayError::ConnectionTimeout(_) => {
                "The gateway did not accept the connection in time. Check that it is powered and on the same network."
            }
            GatewayError::Cancelled => "The connection attempt was replaced by a newer one.",
            GatewayError::NotConnected => "Not connected to the gateway.",
            GatewayError::Timeout { .. } => "The gateway did not answer in time.",
            GatewayError::DeviceRejected { .. } => {
                "The gateway firmware does not support this request."
            }
            GatewayError::SensorInfoUnavailable { .. } => {
                "Sensor information is unavailable. The gateway firmware may not support listing sensors."
            }
            GatewayError::Decode(_) => "The gateway sent a response that could not be understood.",
            _ => match self.kind() {
                ErrorKind::Transport => "Could not communicate with the gateway.",
                ErrorKind::Framing => "The device at this address does not speak the gateway protocol.",
                ErrorKind::IncompleteResponse => {
                    "The gateway closed the connection before sending a complete response."
                }
                ErrorKind::Usage => "The request could not be built.",
                _ => "The gateway request failed.",
            },
        }
    }

    /// `true` for an explicit capability rejection by the device
    pub fn is_device_rejection(&self) -> bool {
        matches!(self, GatewayError::DeviceRejected { .. })
    }
}

/// Result type alias for gateway protocol operations
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(GatewayError::InvalidHeader(0x00, 0x01).kind(), ErrorKind::Framing);
        assert_eq!(
            GatewayError::PrematureClose { received: 10, expected: 16 }.kind(),
            ErrorKind::IncompleteResponse
        );
        assert_eq!(GatewayError::IncompleteHeader { received: 3 }.kind(), ErrorKind::IncompleteResponse);
        assert_eq!(GatewayError::Timeout { received: 0 }.kind(), ErrorKind::Transport);
        assert_eq!(GatewayError::DeviceRejected { command: 0x3D }.kind(), ErrorKind::DeviceRejected);
        assert_eq!(GatewayError::Decode("x".into()).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_explanation_hides_bytes() {
        let err = GatewayError::InvalidHeader(0x12, 0x34);
        assert!(err.to_string().contains("12 34"));
        assert!(!err.explanation().contains("12"));
    }

    #[test]
    fn test_unavailable_message_mentions_firmware() {
        let err = GatewayError::SensorInfoUnavailable {
            legacy: Box::new(GatewayError::Timeout { received: 0 }),
            fallback: Box::new(GatewayError::PrematureClose { received: 7, expected: 20 }),
        };
        let text = err.to_string();
        assert!(text.contains("firmware"));
        assert!(text.contains("7 of 20"));
        assert!(!err.is_device_rejection());
    }
}
