//! Firmware version response

use crate::error::{GatewayError, GatewayResult};

/// Bytes preceding the version string: frame marker, command and length
pub const FIRMWARE_PREFIX_LENGTH: usize = 5;

/// Extract the firmware version string from a complete firmware response
///
/// `frame` is the whole response frame; the version is everything between the
/// 5-byte prefix and the trailing checksum byte.
///
/// # Errors
/// `Decode` when the frame is shorter than 6 bytes or the version contains
/// non-ASCII bytes
pub fn decode_firmware_version(frame: &[u8]) -> GatewayResult<String> {
    if frame.len() < FIRMWARE_PREFIX_LENGTH + 1 {
        return Err(GatewayError::Decode(format!(
            "Firmware response too short: {} bytes",
            frame.len()
        )));
    }

    let version = &frame[FIRMWARE_PREFIX_LENGTH..frame.len() - 1];
    if let Some(pos) = version.iter().position(|b| !b.is_ascii()) {
        return Err(GatewayError::Decode(format!(
            "Firmware version contains non-ASCII byte 0x{:02X} at offset {}",
            version[pos], pos
        )));
    }

    // ASCII is valid UTF-8
    Ok(version.iter().map(|&b| b as char).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_version() {
        let mut frame = vec![0xFF, 0xFF, 0x50, 0x00, 0x05];
        frame.extend_from_slice(b"1.2.3");
        frame.push(0xEE);
        assert_eq!(decode_firmware_version(&frame).unwrap(), "1.2.3");
    }

    #[test]
    fn test_empty_version() {
        let frame = [0xFF, 0xFF, 0x50, 0x00, 0x00, 0x50];
        assert_eq!(decode_firmware_version(&frame).unwrap(), "");
    }

    #[test]
    fn test_too_short() {
        assert!(matches!(
            decode_firmware_version(&[0xFF, 0xFF, 0x50, 0x00, 0x00]),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_non_ascii_is_decode_error() {
        let frame = [0xFF, 0xFF, 0x50, 0x00, 0x03, b'V', 0xC3, 0xA9, 0x00];
        match decode_firmware_version(&frame) {
            Err(GatewayError::Decode(msg)) => assert!(msg.contains("0xC3")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
