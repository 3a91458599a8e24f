//! Session statistics collection

use serde::Serialize;

/// Per-session exchange counters
///
/// Updated by [`crate::GatewaySession`] on every send and receive. The
/// presentation layer may surface them in a diagnostics view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatistics {
    /// Total number of command frames sent
    pub frames_sent: u64,
    /// Total number of complete response frames received
    pub frames_received: u64,
    /// Responses that did not complete before the deadline
    pub timeouts: u64,
    /// Streams that ended before a frame completed
    pub premature_closes: u64,
    /// Responses that did not start with the frame marker
    pub framing_errors: u64,
    /// Complete frames whose checksum did not match
    pub checksum_errors: u64,
    /// Bytes received after the end of a frame and discarded
    pub trailing_bytes: u64,
    /// Late replies to timed-out commands skipped while awaiting another reply
    pub stale_replies: u64,
    /// Unsolicited bytes discarded before sending a command
    pub discarded_bytes: u64,
}

impl SessionStatistics {
    /// Create new statistics with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all statistics counters
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn increment_frames_sent(&mut self) {
        self.frames_sent += 1;
    }

    pub fn increment_frames_received(&mut self) {
        self.frames_received += 1;
    }

    pub fn increment_timeouts(&mut self) {
        self.timeouts += 1;
    }

    pub fn increment_premature_closes(&mut self) {
        self.premature_closes += 1;
    }

    pub fn increment_framing_errors(&mut self) {
        self.framing_errors += 1;
    }

    pub fn increment_checksum_errors(&mut self) {
        self.checksum_errors += 1;
    }

    pub fn add_trailing_bytes(&mut self, count: usize) {
        self.trailing_bytes += count as u64;
    }

    pub fn increment_stale_replies(&mut self) {
        self.stale_replies += 1;
    }

    pub fn add_discarded_bytes(&mut self, count: usize) {
        self.discarded_bytes += count as u64;
    }

    /// Percentage of sent commands that did not yield a usable frame
    ///
    /// Returns 0.0 if nothing has been sent.
    pub fn failure_rate(&self) -> f64 {
        if self.frames_sent == 0 {
            return 0.0;
        }
        let failures = self.timeouts + self.premature_closes + self.framing_errors;
        (failures as f64 / self.frames_sent as f64) * 100.0
    }
}
