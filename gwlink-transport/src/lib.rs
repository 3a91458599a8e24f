//! Transport layer module for the weather-station gateway protocol
//!
//! This crate provides the stream abstraction the framing layer reads from and
//! writes to, a TCP implementation of it, and the [`Connector`] seam used by
//! the connection manager to establish new transports.

pub mod connector;
pub mod error;
pub mod io;
pub mod stream;
pub mod tcp;

pub use connector::{Connector, TcpConnector};
pub use error::{GatewayError, GatewayResult};
pub use io::IoTransport;
pub use stream::{StreamAccessor, TransportLayer};
pub use tcp::{TcpSettings, TcpTransport, DEFAULT_PORT};
