//! Framed request/response session over one transport

use crate::assembler::Assembled;
use crate::error::{GatewayError, GatewayResult};
use crate::frame::{CommandFrame, ResponseFrame};
use crate::receiver::{FrameReceiver, READ_CHUNK_SIZE};
use crate::statistics::SessionStatistics;
use bytes::Bytes;
use gwlink_transport::TransportLayer;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// What to do with a complete frame whose checksum does not match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumPolicy {
    /// Accept the frame without checking
    Ignore,
    /// Accept the frame, log and count the mismatch
    #[default]
    Warn,
    /// Reject the frame with `ChecksumMismatch`
    Strict,
}

/// Most timed-out commands remembered while their replies are outstanding
const MAX_OWED_REPLIES: usize = 4;

/// Framed session
///
/// Owns the transport. One exchange at a time: `request` holds `&mut self`
/// from the write until the response frame is resolved.
///
/// A command that times out may still be answered later. Before every send
/// the session discards bytes nobody asked for, and while awaiting a reply it
/// skips a complete frame that answers an earlier timed-out command. A
/// timeout that leaves the stream mid-frame closes the transport.
#[derive(Debug)]
pub struct GatewaySession<T: TransportLayer> {
    transport: T,
    checksum_policy: ChecksumPolicy,
    statistics: SessionStatistics,
    owed: VecDeque<u8>,
    carry: Bytes,
}

impl<T: TransportLayer> GatewaySession<T> {
    /// Create a session over an already-open transport
    pub fn new(transport: T, checksum_policy: ChecksumPolicy) -> Self {
        Self {
            transport,
            checksum_policy,
            statistics: SessionStatistics::new(),
            owed: VecDeque::with_capacity(MAX_OWED_REPLIES),
            carry: Bytes::new(),
        }
    }

    /// Send one command frame
    ///
    /// Bytes already waiting on the stream are discarded first.
    pub async fn send(&mut self, frame: &CommandFrame) -> GatewayResult<()> {
        if self.transport.is_closed() {
            return Err(GatewayError::NotConnected);
        }
        self.discard_unsolicited().await?;
        if self.transport.is_closed() {
            return Err(GatewayError::NotConnected);
        }

        log::debug!("Sending command frame {}", frame);
        self.transport.write_all(&frame.encode()).await?;
        self.transport.flush().await?;
        self.statistics.increment_frames_sent();
        Ok(())
    }

    /// Receive one response frame within `timeout`
    pub async fn receive(&mut self, timeout: Duration) -> GatewayResult<ResponseFrame> {
        let assembled = self.receive_assembled(timeout).await?;
        Ok(self.finish(assembled))
    }

    /// Send a command and receive its response
    ///
    /// A late reply to an earlier timed-out command is skipped; the deadline
    /// keeps running while it is.
    pub async fn request(
        &mut self,
        frame: &CommandFrame,
        timeout: Duration,
    ) -> GatewayResult<ResponseFrame> {
        self.send(frame).await?;
        let sent = frame.command();
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let assembled = match self.receive_assembled(remaining).await {
                Ok(assembled) => assembled,
                Err(e) => {
                    if matches!(e, GatewayError::Timeout { .. }) && !self.transport.is_closed() {
                        self.remember_owed(sent);
                    }
                    return Err(e);
                }
            };

            let replied = assembled.frame.command();
            if replied != sent && self.settle_owed(replied) {
                log::warn!(
                    "Skipping late reply to command 0x{:02X} while awaiting 0x{:02X}",
                    replied,
                    sent
                );
                self.statistics.increment_stale_replies();
                self.carry = assembled.trailing;
                continue;
            }
            return Ok(self.finish(assembled));
        }
    }

    pub fn statistics(&self) -> &SessionStatistics {
        &self.statistics
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    /// Check if the underlying transport has been closed, by either side
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    /// Close the session
    pub async fn close(&mut self) -> GatewayResult<()> {
        self.transport.close().await
    }

    async fn receive_assembled(&mut self, timeout: Duration) -> GatewayResult<Assembled> {
        let carry = std::mem::take(&mut self.carry);
        let assembled = match FrameReceiver::receive_after(&mut self.transport, &carry, timeout).await {
            Ok(assembled) => assembled,
            Err(e) => {
                match &e {
                    GatewayError::Timeout { received } => {
                        self.statistics.increment_timeouts();
                        if *received > 0 {
                            log::warn!(
                                "Closing stream left mid-frame by a timeout ({} bytes received)",
                                received
                            );
                            let _ = self.transport.close().await;
                        }
                    }
                    GatewayError::IncompleteHeader { .. } | GatewayError::PrematureClose { .. } => {
                        self.statistics.increment_premature_closes()
                    }
                    GatewayError::InvalidHeader(..) => self.statistics.increment_framing_errors(),
                    _ => {}
                }
                log::warn!("Failed to receive response frame: {}", e);
                return Err(e);
            }
        };

        self.statistics.increment_frames_received();
        let frame = &assembled.frame;
        if self.checksum_policy != ChecksumPolicy::Ignore {
            if let Err(e) = frame.verify_checksum() {
                self.statistics.increment_checksum_errors();
                if self.checksum_policy == ChecksumPolicy::Strict {
                    log::warn!("Rejecting response frame: {}", e);
                    return Err(e);
                }
                log::warn!("Accepting response frame despite {}", e);
            }
        }

        log::trace!("Received frame {}", frame.hex_dump());
        Ok(assembled)
    }

    fn finish(&mut self, assembled: Assembled) -> ResponseFrame {
        let frame = assembled.frame;
        if !assembled.trailing.is_empty() {
            self.statistics.add_trailing_bytes(assembled.trailing.len());
            log::warn!(
                "Discarded {} bytes after the end of a {}-byte frame (cmd=0x{:02X})",
                assembled.trailing.len(),
                frame.len(),
                frame.command()
            );
        }
        frame
    }

    fn remember_owed(&mut self, command: u8) {
        if self.owed.len() == MAX_OWED_REPLIES {
            self.owed.pop_front();
        }
        self.owed.push_back(command);
    }

    fn settle_owed(&mut self, command: u8) -> bool {
        match self.owed.iter().position(|&owed| owed == command) {
            Some(index) => {
                self.owed.remove(index);
                true
            }
            None => false,
        }
    }

    async fn discard_unsolicited(&mut self) -> GatewayResult<()> {
        let mut discarded = std::mem::take(&mut self.carry).len();
        let mut scratch = [0u8; READ_CHUNK_SIZE];
        loop {
            let read = tokio::select! {
                biased;
                read = self.transport.read(&mut scratch) => read?,
                _ = std::future::ready(()) => break,
            };
            if read == 0 {
                break;
            }
            discarded += read;
        }

        if discarded > 0 {
            self.statistics.add_discarded_bytes(discarded);
            log::warn!("Discarded {} unsolicited bytes before sending", discarded);
        }
        Ok(())
    }
}
