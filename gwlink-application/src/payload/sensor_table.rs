//! Sensor table payload
//!
//! ```text
//! [count:1] { [type:1] [id:4 BE] [battery:1] [signal:1] } x count
//! ```

use crate::error::{GatewayError, GatewayResult};
use gwlink_core::{SensorRecord, SensorTable, Truncation};

/// Decode a sensor-id response payload
///
/// A payload holding fewer than `count` complete records is not an error:
/// the complete records are returned and the table carries a
/// [`Truncation`] marker.
///
/// # Errors
/// `Decode` when the payload is empty (no count byte)
pub fn decode_sensor_table(payload: &[u8]) -> GatewayResult<SensorTable> {
    let (&count, body) = payload
        .split_first()
        .ok_or_else(|| GatewayError::Decode("Sensor table payload is empty".to_string()))?;
    let declared = count as usize;

    let records: Vec<SensorRecord> = body
        .chunks_exact(SensorRecord::WIRE_LENGTH)
        .take(declared)
        .map(|r| SensorRecord::new(r[0], u32::from_be_bytes([r[1], r[2], r[3], r[4]]), r[5], r[6]))
        .collect();

    let truncation = if records.len() < declared {
        log::warn!(
            "Sensor table declares {} records but the payload holds {} complete records ({} record bytes)",
            declared,
            records.len(),
            body.len()
        );
        Some(Truncation {
            declared,
            decoded: records.len(),
        })
    } else {
        let surplus = body.len() - declared * SensorRecord::WIRE_LENGTH;
        if surplus > 0 {
            log::debug!("Ignoring {} bytes after {} sensor records", surplus, declared);
        }
        None
    };

    Ok(SensorTable {
        records,
        truncation,
    })
}
