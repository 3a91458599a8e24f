//! Gateway command codes
//!
//! The numeric values are part of the wire contract and are echoed back by the
//! device in byte 2 of every response frame.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Command byte the gateway returns in place of the echoed command when it
/// does not support the request.
pub const DEVICE_ERROR_UNSUPPORTED: u8 = 0x5B;

/// Commands understood by this client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CommandCode {
    /// Read sensor IDs, legacy command variant
    ReadSensorIdLegacy = 0x3D,
    /// Read sensor IDs, newer command variant
    ReadSensorIdNew = 0x3C,
    ReadFirmware = 0x50,
    ReadRainData = 0x34,
    ReadEcowittNetwork = 0x24,
    ReadLiveData = 0x27,
}

impl CommandCode {
    /// All known command codes
    pub const ALL: [CommandCode; 6] = [
        CommandCode::ReadSensorIdLegacy,
        CommandCode::ReadSensorIdNew,
        CommandCode::ReadFirmware,
        CommandCode::ReadRainData,
        CommandCode::ReadEcowittNetwork,
        CommandCode::ReadLiveData,
    ];

    /// Wire value of this command
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a command by its wire value
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == byte)
    }

    /// Get human-readable command name
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCode::ReadSensorIdLegacy => "read-sensor-id-legacy",
            CommandCode::ReadSensorIdNew => "read-sensor-id-new",
            CommandCode::ReadFirmware => "read-firmware",
            CommandCode::ReadRainData => "read-rain-data",
            CommandCode::ReadEcowittNetwork => "read-ecowitt-network",
            CommandCode::ReadLiveData => "read-live-data",
        }
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:02X})", self.as_str(), self.code())
    }
}

impl From<CommandCode> for u8 {
    fn from(command: CommandCode) -> Self {
        command.code()
    }
}
