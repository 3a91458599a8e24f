//! Weather-station gateway client
//!
//! This crate owns the connection lifecycle and exposes the request API:
//!
//! - [`connection`]: connection state, the connection manager and the client builder
//! - [`config`]: serializable client configuration with defaults
//! - [`client`]: [`GatewayClient`], one method per logical request

pub mod client;
pub mod config;
pub mod connection;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use connection::{
    ConnectionManager, ConnectionState, ConnectionStatus, DESYNCHRONIZED, GatewayClientBuilder,
    REMOTE_CLOSED,
};
pub use error::{ErrorKind, GatewayError, GatewayResult};
