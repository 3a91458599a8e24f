//! Gateway frame structure and encoding/decoding
//!
//! Requests and responses share one layout, all multi-byte fields big-endian:
//!
//! ```text
//! FF FF <cmd:1> <len_hi:1> <len_lo:1> <payload:len> <checksum:1>
//! ```
//!
//! The checksum is the low byte of the sum of `cmd`, both length bytes and the
//! payload.

use crate::checksum::Checksum;
use crate::error::{GatewayError, GatewayResult};
use bytes::Bytes;
use std::fmt;

/// Frame start marker
pub const HEADER: [u8; 2] = [0xFF, 0xFF];

/// Bytes needed before the payload length can be read (marker, command, length)
pub const HEADER_LENGTH: usize = 5;

/// Header plus trailing checksum byte
pub const FRAME_OVERHEAD: usize = HEADER_LENGTH + 1;

/// Largest payload the 16-bit length field can describe
pub const MAX_PAYLOAD_LENGTH: usize = u16::MAX as usize;

/// Outbound command frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    command: u8,
    payload: Bytes,
    checksum: u8,
}

impl CommandFrame {
    /// Build a command frame
    ///
    /// # Errors
    /// `PayloadTooLarge` if `payload` does not fit the 16-bit length field
    pub fn new(command: impl Into<u8>, payload: &[u8]) -> GatewayResult<Self> {
        let command = command.into();
        let length = u16::try_from(payload.len())
            .map_err(|_| GatewayError::PayloadTooLarge(payload.len()))?;

        let mut checksum = Checksum::new();
        checksum.update(command);
        checksum.update_bytes(&length.to_be_bytes());
        checksum.update_bytes(payload);

        Ok(Self {
            command,
            payload: Bytes::copy_from_slice(payload),
            checksum: checksum.value(),
        })
    }

    pub fn command(&self) -> u8 {
        self.command
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Total encoded size
    pub fn wire_length(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    /// Encode frame to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(self.wire_length());
        result.extend_from_slice(&HEADER);
        result.push(self.command);
        // Length was range-checked in `new`
        result.extend_from_slice(&(self.payload.len() as u16).to_be_bytes());
        result.extend_from_slice(&self.payload);
        result.push(self.checksum);
        result
    }
}

impl fmt::Display for CommandFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cmd=0x{:02X} len={} checksum=0x{:02X}",
            self.command,
            self.payload.len(),
            self.checksum
        )
    }
}

/// Encode a command frame in one step
pub fn build_command(command: impl Into<u8>, payload: &[u8]) -> GatewayResult<Vec<u8>> {
    Ok(CommandFrame::new(command, payload)?.encode())
}

/// One complete inbound frame
///
/// Holds exactly `6 + payload_length` bytes with a verified `FF FF` marker.
/// The checksum is not verified on construction; see [`ResponseFrame::verify_checksum`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    bytes: Bytes,
}

impl ResponseFrame {
    /// Wrap bytes already known to form exactly one frame
    pub(crate) fn from_complete(bytes: Bytes) -> Self {
        debug_assert!(bytes.len() >= FRAME_OVERHEAD);
        Self { bytes }
    }

    /// Decode one frame from the front of `data`
    ///
    /// Bytes past the end of the frame are ignored.
    ///
    /// # Errors
    /// - `IncompleteHeader` when fewer than 5 bytes are present
    /// - `InvalidHeader` when the first two bytes are not `FF FF`
    /// - `PrematureClose` when the declared payload does not fit in `data`
    pub fn parse(data: &[u8]) -> GatewayResult<Self> {
        if data.len() < HEADER_LENGTH {
            return Err(GatewayError::IncompleteHeader { received: data.len() });
        }
        if data[..2] != HEADER {
            return Err(GatewayError::InvalidHeader(data[0], data[1]));
        }
        let expected = FRAME_OVERHEAD + u16::from_be_bytes([data[3], data[4]]) as usize;
        if data.len() < expected {
            return Err(GatewayError::PrematureClose {
                received: data.len(),
                expected,
            });
        }
        Ok(Self::from_complete(Bytes::copy_from_slice(&data[..expected])))
    }

    /// Echoed command byte, or the device's error code
    pub fn command(&self) -> u8 {
        self.bytes[2]
    }

    pub fn payload_length(&self) -> usize {
        u16::from_be_bytes([self.bytes[3], self.bytes[4]]) as usize
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes[HEADER_LENGTH..self.bytes.len() - 1]
    }

    /// Checksum byte carried by the frame
    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// Checksum recomputed over command, length and payload
    pub fn computed_checksum(&self) -> u8 {
        Checksum::of(&self.bytes[2..self.bytes.len() - 1])
    }

    pub fn verify_checksum(&self) -> GatewayResult<()> {
        let computed = self.computed_checksum();
        if computed == self.checksum() {
            Ok(())
        } else {
            Err(GatewayError::ChecksumMismatch {
                received: self.checksum(),
                computed,
            })
        }
    }

    /// Raw frame bytes including marker and checksum
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Space-separated hex dump for diagnostics
    pub fn hex_dump(&self) -> String {
        self.bytes
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
