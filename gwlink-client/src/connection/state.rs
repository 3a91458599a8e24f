//! Connection state machine

use crate::error::ErrorKind;

/// Connection state
///
/// # State Transitions
/// ```text
/// Disconnected | Failed | Cancelled | Ready -> Connecting   (connect)
/// Connecting -> Ready                                       (transport open)
/// Connecting -> Failed                                      (refused, timed out)
/// Connecting -> Cancelled                                   (caller gave up)
/// Ready -> Failed                                           (remote closed)
/// any -> Disconnected                                       (disconnect)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection (initial state)
    #[default]
    Disconnected,
    /// A connection attempt is in flight
    Connecting,
    /// Connected and usable for exchanges
    Ready,
    /// The last attempt failed or the remote closed the connection
    Failed(String),
    /// The last attempt was abandoned before it completed
    Cancelled,
}

impl ConnectionState {
    /// Check if the connection is ready for exchanges
    pub fn is_ready(&self) -> bool {
        matches!(self, ConnectionState::Ready)
    }

    /// Check whether moving to `new_state` follows the documented transitions
    pub fn can_transition_to(&self, new_state: &ConnectionState) -> bool {
        use ConnectionState::*;
        match (self, new_state) {
            (_, Disconnected) => true,
            (_, Connecting) => true,
            (Connecting, Ready | Failed(_) | Cancelled) => true,
            (Ready, Failed(_)) => true,
            _ => false,
        }
    }

    /// Get human-readable state name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Disconnected",
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Ready => "Ready",
            ConnectionState::Failed(_) => "Failed",
            ConnectionState::Cancelled => "Cancelled",
        }
    }
}

/// Observable connection status published to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// `host:port` of the current or last attempted connection
    pub endpoint: Option<String>,
    /// Human-readable explanation of the most recent failure
    pub last_error_message: Option<String>,
    pub last_error_kind: Option<ErrorKind>,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.state.is_ready()
    }
}
