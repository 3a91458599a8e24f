//! Connection management module

pub mod builder;
pub mod manager;
pub mod state;

pub use builder::GatewayClientBuilder;
pub use manager::{ConnectionManager, DESYNCHRONIZED, REMOTE_CLOSED};
pub use state::{ConnectionState, ConnectionStatus};
