//! Response frame assembly state machine
//!
//! Socket reads are not aligned with frame boundaries. The assembler
//! accumulates arbitrary chunks and decides, after every event, whether a
//! complete frame is available, more bytes are needed, or the exchange has
//! failed.
//!
//! # State Transitions
//! ```text
//! AwaitingHeader --(>= 5 bytes, FF FF)--> AwaitingBody
//! AwaitingHeader --(>= 5 bytes, bad marker)--> Failed(InvalidHeader)
//! AwaitingHeader --(stream closed)--> Failed(IncompleteHeader)
//! AwaitingBody --(>= 6 + len bytes)--> Complete
//! AwaitingBody --(stream closed)--> Failed(PrematureClose)
//! any --(timeout)--> Failed(Timeout)
//! ```
//!
//! [`FrameAssembler::advance`] takes the assembler by value and only hands it
//! back inside [`Progress::Pending`]. Once `Complete` or `Failed` has been
//! produced there is no assembler left to feed, so a request resolves at most
//! once.

use crate::error::GatewayError;
use crate::frame::{ResponseFrame, FRAME_OVERHEAD, HEADER, HEADER_LENGTH};
use bytes::{Bytes, BytesMut};

/// Input to the assembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveEvent<'a> {
    /// A chunk of any size arrived from the socket
    BytesArrived(&'a [u8]),
    /// The remote end closed the stream
    StreamClosed,
    /// The per-command deadline elapsed
    TimeoutFired,
}

/// Non-terminal assembly phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyPhase {
    /// Fewer than 5 bytes buffered, payload length unknown
    AwaitingHeader,
    /// Payload length known, waiting for `expected_total` bytes
    AwaitingBody { expected_total: usize },
}

/// A completed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembled {
    pub frame: ResponseFrame,
    /// Bytes that arrived after the end of the frame
    pub trailing: Bytes,
}

/// Outcome of feeding one event
#[derive(Debug)]
pub enum Progress {
    Pending(FrameAssembler),
    Complete(Assembled),
    Failed(GatewayError),
}

impl Progress {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Progress::Pending(_))
    }
}

/// Accumulates socket bytes into one response frame
#[derive(Debug, Default)]
pub struct FrameAssembler {
    buffer: BytesMut,
    expected_total: Option<usize>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            expected_total: None,
        }
    }

    pub fn phase(&self) -> AssemblyPhase {
        match self.expected_total {
            None => AssemblyPhase::AwaitingHeader,
            Some(expected_total) => AssemblyPhase::AwaitingBody { expected_total },
        }
    }

    /// Bytes buffered so far
    pub fn received(&self) -> usize {
        self.buffer.len()
    }

    /// Feed one event, consuming the assembler
    pub fn advance(mut self, event: ReceiveEvent<'_>) -> Progress {
        match event {
            ReceiveEvent::BytesArrived(chunk) => {
                self.buffer.extend_from_slice(chunk);
                self.evaluate()
            }
            ReceiveEvent::StreamClosed => {
                let received = self.buffer.len();
                match self.expected_total {
                    None => Progress::Failed(GatewayError::IncompleteHeader { received }),
                    Some(expected) => Progress::Failed(GatewayError::PrematureClose {
                        received,
                        expected,
                    }),
                }
            }
            ReceiveEvent::TimeoutFired => Progress::Failed(GatewayError::Timeout {
                received: self.buffer.len(),
            }),
        }
    }

    fn evaluate(mut self) -> Progress {
        if self.expected_total.is_none() && self.buffer.len() >= HEADER_LENGTH {
            if self.buffer[..2] != HEADER {
                return Progress::Failed(GatewayError::InvalidHeader(
                    self.buffer[0],
                    self.buffer[1],
                ));
            }
            let payload_length = u16::from_be_bytes([self.buffer[3], self.buffer[4]]) as usize;
            self.expected_total = Some(FRAME_OVERHEAD + payload_length);
        }

        match self.expected_total {
            Some(expected) if self.buffer.len() >= expected => {
                let frame = ResponseFrame::from_complete(self.buffer.split_to(expected).freeze());
                let trailing = self.buffer.split().freeze();
                Progress::Complete(Assembled { frame, trailing })
            }
            _ => Progress::Pending(self),
        }
    }
}
