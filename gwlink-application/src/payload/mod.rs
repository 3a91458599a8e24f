//! Response payload decoders

pub mod firmware;
pub mod sensor_table;

pub use firmware::{decode_firmware_version, FIRMWARE_PREFIX_LENGTH};
pub use sensor_table::decode_sensor_table;
