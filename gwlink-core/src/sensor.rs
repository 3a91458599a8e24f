//! Sensor inventory model
//!
//! A [`SensorRecord`] is one decoded entry from the gateway's sensor table.
//! Everything else in this module is a pure, derived view over its raw fields.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor ID the gateway reports for a slot that is still searching
pub const SENSOR_ID_SEARCHING: u32 = 0xFFFF_FFFF;
/// Sensor ID the gateway reports for a slot that has been disabled
pub const SENSOR_ID_DISABLED: u32 = 0xFFFF_FFFE;

/// Wireless sensor hardware family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorModel {
    Wh65,
    Wh68,
    Wh80,
    Wh40,
    Wh25,
    Wh26,
    Wh31,
    Wh51,
    Wh41,
    Wh57,
    Wh55,
    Wh34,
    Wh45,
    Wh35,
    Wh90,
    Unknown,
}

struct TypeEntry {
    first: u8,
    last: u8,
    model: SensorModel,
    name: &'static str,
    icon: &'static str,
}

/// Type codes → hardware family. Ranges spanning several codes are
/// multi-channel families; the channel is `code - first + 1`.
const SENSOR_TYPES: &[TypeEntry] = &[
    TypeEntry { first: 0, last: 0, model: SensorModel::Wh65, name: "Outdoor Sensor Array", icon: "cloud.sun" },
    TypeEntry { first: 1, last: 1, model: SensorModel::Wh68, name: "Solar Anemometer", icon: "wind" },
    TypeEntry { first: 2, last: 2, model: SensorModel::Wh80, name: "Ultrasonic Anemometer", icon: "wind" },
    TypeEntry { first: 3, last: 3, model: SensorModel::Wh40, name: "Rain Gauge", icon: "cloud.rain" },
    TypeEntry { first: 4, last: 4, model: SensorModel::Wh25, name: "Indoor Temperature/Humidity/Pressure", icon: "house" },
    TypeEntry { first: 5, last: 5, model: SensorModel::Wh26, name: "Outdoor Temperature/Humidity", icon: "thermometer" },
    TypeEntry { first: 6, last: 13, model: SensorModel::Wh31, name: "Temperature/Humidity", icon: "thermometer" },
    TypeEntry { first: 14, last: 21, model: SensorModel::Wh51, name: "Soil Moisture", icon: "leaf" },
    TypeEntry { first: 22, last: 25, model: SensorModel::Wh41, name: "PM2.5 Air Quality", icon: "aqi.medium" },
    TypeEntry { first: 26, last: 26, model: SensorModel::Wh57, name: "Lightning Detector", icon: "bolt" },
    TypeEntry { first: 27, last: 30, model: SensorModel::Wh55, name: "Water Leak", icon: "drop" },
    TypeEntry { first: 31, last: 38, model: SensorModel::Wh34, name: "Soil/Water Temperature", icon: "thermometer.medium" },
    TypeEntry { first: 39, last: 39, model: SensorModel::Wh45, name: "CO2/PM2.5/PM10 Air Quality", icon: "aqi.high" },
    TypeEntry { first: 40, last: 47, model: SensorModel::Wh35, name: "Leaf Wetness", icon: "leaf.fill" },
    TypeEntry { first: 48, last: 48, model: SensorModel::Wh90, name: "Outdoor Weather Station", icon: "cloud.sun.rain" },
];

/// Sensor type resolved from the raw type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorType {
    code: u8,
    model: SensorModel,
    channel: Option<u8>,
}

impl SensorType {
    /// Resolve a raw type code against the fixed lookup table
    pub fn from_code(code: u8) -> Self {
        match Self::entry(code) {
            Some(entry) => Self {
                code,
                model: entry.model,
                channel: (entry.first != entry.last).then(|| code - entry.first + 1),
            },
            None => Self {
                code,
                model: SensorModel::Unknown,
                channel: None,
            },
        }
    }

    fn entry(code: u8) -> Option<&'static TypeEntry> {
        SENSOR_TYPES
            .iter()
            .find(|entry| (entry.first..=entry.last).contains(&code))
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn model(&self) -> SensorModel {
        self.model
    }

    /// Channel number (1-based) for multi-channel sensor families
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }

    /// Display name, e.g. `"Soil Moisture CH3"`
    pub fn name(&self) -> String {
        match (Self::entry(self.code), self.channel) {
            (Some(entry), Some(channel)) => format!("{} CH{}", entry.name, channel),
            (Some(entry), None) => entry.name.to_string(),
            (None, _) => format!("Unknown Sensor (type {})", self.code),
        }
    }

    /// Symbolic icon name for the presentation layer
    pub fn icon(&self) -> &'static str {
        Self::entry(self.code)
            .map(|entry| entry.icon)
            .unwrap_or("sensor")
    }
}

/// Radio signal quality, ordinal 0–4
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SignalLevel {
    Unknown = 0,
    Weak = 1,
    Fair = 2,
    Good = 3,
    Excellent = 4,
}

impl SignalLevel {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            1 => SignalLevel::Weak,
            2 => SignalLevel::Fair,
            3 => SignalLevel::Good,
            4 => SignalLevel::Excellent,
            _ => SignalLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLevel::Unknown => "Unknown",
            SignalLevel::Weak => "Weak",
            SignalLevel::Fair => "Fair",
            SignalLevel::Good => "Good",
            SignalLevel::Excellent => "Excellent",
        }
    }
}

/// Battery state bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BatteryLevel {
    Critical,
    Low,
    Medium,
    Good,
    Unknown,
}

impl BatteryLevel {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => BatteryLevel::Critical,
            1..=2 => BatteryLevel::Low,
            3..=4 => BatteryLevel::Medium,
            5..=6 => BatteryLevel::Good,
            _ => BatteryLevel::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BatteryLevel::Critical => "Critical",
            BatteryLevel::Low => "Low",
            BatteryLevel::Medium => "Medium",
            BatteryLevel::Good => "Good",
            BatteryLevel::Unknown => "Unknown",
        }
    }
}

/// Pairing state of a sensor slot, derived from its ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Registration {
    Registered,
    Searching,
    Disabled,
}

/// One entry of the gateway's sensor table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorRecord {
    pub sensor_type: u8,
    pub sensor_id: u32,
    pub battery_raw: u8,
    pub signal_raw: u8,
}

impl SensorRecord {
    /// Encoded size of one record on the wire
    pub const WIRE_LENGTH: usize = 7;

    pub fn new(sensor_type: u8, sensor_id: u32, battery_raw: u8, signal_raw: u8) -> Self {
        Self {
            sensor_type,
            sensor_id,
            battery_raw,
            signal_raw,
        }
    }

    pub fn kind(&self) -> SensorType {
        SensorType::from_code(self.sensor_type)
    }

    pub fn signal(&self) -> SignalLevel {
        SignalLevel::from_raw(self.signal_raw)
    }

    pub fn battery(&self) -> BatteryLevel {
        BatteryLevel::from_raw(self.battery_raw)
    }

    /// Battery voltage in volts, when the gateway reports a non-zero raw value
    pub fn voltage(&self) -> Option<f32> {
        (self.battery_raw > 0).then(|| self.battery_raw as f32 / 10.0)
    }

    pub fn registration(&self) -> Registration {
        match self.sensor_id {
            SENSOR_ID_SEARCHING => Registration::Searching,
            SENSOR_ID_DISABLED => Registration::Disabled,
            _ => Registration::Registered,
        }
    }
}

impl fmt::Display for SensorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:08X}] battery={} signal={}",
            self.kind().name(),
            self.sensor_id,
            self.battery().as_str(),
            self.signal().as_str()
        )
    }
}

/// Marker attached to a sensor table whose payload held fewer records than
/// its count byte declared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Truncation {
    pub declared: usize,
    pub decoded: usize,
}

/// Decoded sensor table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorTable {
    pub records: Vec<SensorRecord>,
    pub truncation: Option<Truncation>,
}

impl SensorTable {
    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records for slots that have a paired sensor
    pub fn registered(&self) -> impl Iterator<Item = &SensorRecord> {
        self.records
            .iter()
            .filter(|r| r.registration() == Registration::Registered)
    }
}
