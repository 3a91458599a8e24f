//! Error types re-exported from the core crate

pub use gwlink_core::error::{ErrorKind, GatewayError, GatewayResult};
