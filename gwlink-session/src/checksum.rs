//! Additive frame checksum
//!
//! The checksum covers the command byte, both length bytes and the payload.
//! The two `0xFF` header bytes are not part of it.

/// Running truncated-sum checksum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    pub fn update_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.update(byte);
        }
    }

    /// Low byte of the sum of everything fed so far
    pub fn value(&self) -> u8 {
        self.sum
    }

    /// One-shot checksum of `data`
    pub fn of(data: &[u8]) -> u8 {
        let mut checksum = Self::new();
        checksum.update_bytes(data);
        checksum.value()
    }
}
