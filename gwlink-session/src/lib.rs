//! Framing layer for the weather-station gateway protocol
//!
//! This crate builds command frames, assembles response frames from an
//! unaligned byte stream, and runs one request/response exchange at a time
//! over a transport.
//!
//! - [`checksum`]: truncated additive checksum
//! - [`frame`]: `CommandFrame` builder and `ResponseFrame` decoder
//! - [`assembler`]: event-driven receive state machine
//! - [`receiver`]: async loop feeding socket reads and the deadline into the assembler
//! - [`session`]: framed session with checksum policy and statistics

pub mod assembler;
pub mod checksum;
pub mod error;
pub mod frame;
pub mod receiver;
pub mod session;
pub mod statistics;

pub use assembler::{Assembled, AssemblyPhase, FrameAssembler, Progress, ReceiveEvent};
pub use checksum::Checksum;
pub use error::{GatewayError, GatewayResult};
pub use frame::{
    build_command, CommandFrame, ResponseFrame, FRAME_OVERHEAD, HEADER, HEADER_LENGTH,
    MAX_PAYLOAD_LENGTH,
};
pub use receiver::{FrameReceiver, READ_CHUNK_SIZE};
pub use session::{ChecksumPolicy, GatewaySession};
pub use statistics::SessionStatistics;
