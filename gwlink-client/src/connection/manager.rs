//! Connection lifecycle
//!
//! The manager owns at most one live [`GatewaySession`]. `connect` always
//! tears down the previous connection first. Overlapping `connect` calls
//! resolve last-caller-wins: each call takes a new attempt number, and an
//! attempt that is no longer current finishes with `Cancelled` and never
//! installs its transport. `disconnect` also advances the attempt number, so
//! it cancels any attempt in flight.
//!
//! State changes are published on a `watch` channel; the presentation layer
//! subscribes instead of polling.

use super::state::{ConnectionState, ConnectionStatus};
use crate::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use gwlink_application::FrameExchange;
use gwlink_session::{ChecksumPolicy, CommandFrame, GatewaySession, ResponseFrame, SessionStatistics};
use gwlink_transport::Connector;
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Message recorded when the gateway closes an established connection
pub const REMOTE_CLOSED: &str = "remote closed the connection";

/// Message recorded when a timeout leaves the response stream mid-frame
pub const DESYNCHRONIZED: &str = "response stream lost frame alignment";

struct ActiveSession<T: gwlink_transport::TransportLayer> {
    attempt: u64,
    session: GatewaySession<T>,
}

/// Connection manager
///
/// All methods take `&self`; exchanges are serialized by the session lock.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    checksum_policy: ChecksumPolicy,
    active: Mutex<Option<ActiveSession<C::Transport>>>,
    attempt: watch::Sender<u64>,
    status: watch::Sender<ConnectionStatus>,
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(connector: C, checksum_policy: ChecksumPolicy) -> Self {
        Self {
            connector,
            checksum_policy,
            active: Mutex::new(None),
            attempt: watch::Sender::new(0),
            status: watch::Sender::new(ConnectionStatus::default()),
        }
    }

    /// Open a connection to `host:port`
    ///
    /// Any existing connection is closed first. Resolves once the transport is
    /// ready, the attempt fails, the connector's `timeout` elapses, or a later
    /// `connect` or `disconnect` supersedes this attempt.
    ///
    /// # Errors
    /// - `ConnectionFailed` if the gateway cannot be reached
    /// - `ConnectionTimeout` if `timeout` elapses first
    /// - `Cancelled` if superseded
    pub async fn connect(&self, host: &str, port: u16, timeout: Duration) -> GatewayResult<()> {
        let id = self.begin_attempt();
        let mut superseded = self.attempt.subscribe();
        let endpoint = format!("{}:{}", host, port);

        self.publish(ConnectionState::Connecting, |status| {
            status.endpoint = Some(endpoint.clone());
        });
        let mut guard = AttemptGuard {
            manager: self,
            id,
            armed: true,
        };
        log::info!("Connecting to gateway at {} (attempt {})", endpoint, id);

        self.teardown().await;
        if !self.is_current(id) {
            guard.armed = false;
            return Err(GatewayError::Cancelled);
        }

        let outcome = tokio::select! {
            result = self.connector.connect(host, port, timeout) => Some(result),
            _ = superseded.wait_for(|current| *current != id) => None,
        };
        guard.armed = false;

        let transport = match outcome {
            None => {
                log::debug!("Connection attempt {} to {} superseded", id, endpoint);
                return Err(GatewayError::Cancelled);
            }
            Some(Err(e)) => {
                let e = match e {
                    GatewayError::Connection(io) => GatewayError::ConnectionFailed(io.to_string()),
                    other => other,
                };
                self.fail_attempt(id, &e);
                return Err(e);
            }
            Some(Ok(transport)) => transport,
        };

        let mut active = self.active.lock().await;
        if !self.is_current(id) {
            drop(active);
            log::debug!("Discarding transport from superseded attempt {}", id);
            let mut session = GatewaySession::new(transport, self.checksum_policy);
            let _ = session.close().await;
            return Err(GatewayError::Cancelled);
        }

        *active = Some(ActiveSession {
            attempt: id,
            session: GatewaySession::new(transport, self.checksum_policy),
        });
        self.publish(ConnectionState::Ready, |status| {
            status.last_error_message = None;
            status.last_error_kind = None;
        });
        log::info!("Connected to gateway at {}", endpoint);
        Ok(())
    }

    /// Close the connection
    ///
    /// The manager reports not-connected as soon as this is called; the
    /// transport is closed once any in-flight exchange has finished.
    pub async fn disconnect(&self) {
        self.begin_attempt();
        self.publish(ConnectionState::Disconnected, |_| {});
        self.teardown().await;
        log::info!("Disconnected from gateway");
    }

    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state.clone()
    }

    /// Snapshot of the current status
    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn last_error_message(&self) -> Option<String> {
        self.status.borrow().last_error_message.clone()
    }

    /// `host:port` of the current or last attempted connection
    pub fn endpoint(&self) -> Option<String> {
        self.status.borrow().endpoint.clone()
    }

    /// Record `error` as the most recent failure
    pub fn record_error(&self, error: &GatewayError) {
        let message = error.explanation().to_string();
        let kind = error.kind();
        self.status.send_modify(|status| {
            status.last_error_message = Some(message);
            status.last_error_kind = Some(kind);
        });
    }

    /// Counters of the live session, if any
    pub async fn statistics(&self) -> Option<SessionStatistics> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|active| active.session.statistics().clone())
    }

    pub fn checksum_policy(&self) -> ChecksumPolicy {
        self.checksum_policy
    }

    /// Run one exchange on the live session
    ///
    /// # Errors
    /// `NotConnected` without a live session; otherwise whatever the session
    /// reports. A transport that closed during the exchange moves the state to
    /// `Failed`.
    pub async fn request(
        &self,
        frame: &CommandFrame,
        timeout: Duration,
    ) -> GatewayResult<ResponseFrame> {
        let mut slot = self.active.lock().await;
        if slot.as_ref().is_some_and(|a| !self.is_current(a.attempt)) {
            if let Some(mut superseded) = slot.take() {
                log::debug!("Closing connection from superseded attempt {}", superseded.attempt);
                let _ = superseded.session.close().await;
            }
        }
        let Some(active) = slot.as_mut() else {
            let e = GatewayError::NotConnected;
            self.record_error(&e);
            return Err(e);
        };

        let result = active.session.request(frame, timeout).await;
        let lost = active.session.is_closed() || matches!(result, Err(GatewayError::Connection(_)));
        if lost {
            let id = active.attempt;
            let reason = match &result {
                Err(GatewayError::Timeout { .. }) => DESYNCHRONIZED,
                _ => REMOTE_CLOSED,
            };
            log::warn!("Gateway connection lost (attempt {}): {}", id, reason);
            let _ = active.session.close().await;
            *slot = None;
            if self.is_current(id) {
                self.publish(ConnectionState::Failed(reason.to_string()), |_| {});
            }
        }
        drop(slot);

        if let Err(e) = &result {
            self.record_error(e);
        }
        result
    }

    fn begin_attempt(&self) -> u64 {
        let mut id = 0;
        self.attempt.send_modify(|current| {
            *current += 1;
            id = *current;
        });
        id
    }

    fn is_current(&self, id: u64) -> bool {
        *self.attempt.borrow() == id
    }

    fn fail_attempt(&self, id: u64, error: &GatewayError) {
        log::warn!("Connection attempt {} failed: {}", id, error);
        if !self.is_current(id) {
            return;
        }
        let message = error.explanation().to_string();
        let kind = error.kind();
        self.publish(ConnectionState::Failed(error.to_string()), |status| {
            status.last_error_message = Some(message);
            status.last_error_kind = Some(kind);
        });
    }

    /// Move to `next` and apply `update` in the same notification
    fn publish(&self, next: ConnectionState, update: impl FnOnce(&mut ConnectionStatus)) {
        self.status.send_modify(|status| {
            debug_assert!(
                status.state.can_transition_to(&next),
                "invalid connection state change {} -> {}",
                status.state.as_str(),
                next.as_str()
            );
            status.state = next;
            update(status);
        });
    }

    async fn teardown(&self) {
        let previous = self.active.lock().await.take();
        if let Some(mut active) = previous {
            log::debug!("Closing connection from attempt {}", active.attempt);
            if let Err(e) = active.session.close().await {
                log::debug!("Error while closing transport: {}", e);
            }
        }
    }
}

#[async_trait]
impl<C: Connector> FrameExchange for ConnectionManager<C> {
    async fn exchange(&self, frame: CommandFrame, timeout: Duration) -> GatewayResult<ResponseFrame> {
        self.request(&frame, timeout).await
    }

    fn is_ready(&self) -> bool {
        self.is_connected()
    }
}

/// Publishes `Cancelled` if a connect future is dropped mid-attempt
struct AttemptGuard<'a, C: Connector> {
    manager: &'a ConnectionManager<C>,
    id: u64,
    armed: bool,
}

impl<C: Connector> Drop for AttemptGuard<'_, C> {
    fn drop(&mut self) {
        if self.armed && self.manager.is_current(self.id) {
            log::debug!("Connection attempt {} abandoned", self.id);
            self.manager.publish(ConnectionState::Cancelled, |_| {});
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedConnector};
    use gwlink_core::ErrorKind;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn firmware_reply(command: u8, _payload: &[u8]) -> Reply {
        Reply::frame(command, b"V1.0")
    }

    #[tokio::test]
    async fn test_connect_and_exchange() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Strict);
        let mut status = manager.subscribe();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();
        assert!(manager.is_connected());
        assert!(status.has_changed().unwrap());
        assert_eq!(status.borrow_and_update().endpoint.as_deref(), Some("gateway:45000"));

        let frame = CommandFrame::new(0x50u8, &[]).unwrap();
        let response = manager.request(&frame, TIMEOUT).await.unwrap();
        assert_eq!(response.command(), 0x50);
        assert_eq!(response.payload(), b"V1.0");

        let stats = manager.statistics().await.unwrap();
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.frames_received, 1);
    }

    #[tokio::test]
    async fn test_request_without_connection() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);
        let frame = CommandFrame::new(0x50u8, &[]).unwrap();

        assert!(matches!(
            manager.request(&frame, TIMEOUT).await,
            Err(GatewayError::NotConnected)
        ));
        assert!(!manager.is_ready());
        assert_eq!(manager.status().last_error_kind, Some(ErrorKind::Transport));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);

        let result = manager.connect(ScriptedConnector::REFUSED, 45000, TIMEOUT).await;
        assert!(matches!(result, Err(GatewayError::ConnectionFailed(_))));
        assert!(matches!(manager.state(), ConnectionState::Failed(_)));
        assert!(manager.last_error_message().is_some());
        assert!(!manager.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);

        let result = manager
            .connect(ScriptedConnector::STALL, 45000, Duration::from_millis(200))
            .await;
        assert!(matches!(result, Err(GatewayError::ConnectionTimeout(t)) if t == Duration::from_millis(200)));
        assert!(matches!(manager.state(), ConnectionState::Failed(_)));
    }

    #[tokio::test]
    async fn test_last_connect_wins() {
        let connector = ScriptedConnector::new(firmware_reply);
        let manager = ConnectionManager::new(connector, ChecksumPolicy::Warn);

        let (first, second) = tokio::join!(
            manager.connect(ScriptedConnector::STALL, 45000, TIMEOUT),
            async {
                tokio::task::yield_now().await;
                manager.connect("gateway", 45000, TIMEOUT).await
            }
        );

        assert!(matches!(first, Err(GatewayError::Cancelled)));
        assert!(second.is_ok());
        assert!(manager.is_connected());
        assert_eq!(manager.status().endpoint.as_deref(), Some("gateway:45000"));
    }

    #[tokio::test]
    async fn test_disconnect_cancels_pending_connect() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);

        let (result, _) = tokio::join!(
            manager.connect(ScriptedConnector::STALL, 45000, TIMEOUT),
            async {
                tokio::task::yield_now().await;
                manager.disconnect().await
            }
        );

        assert!(matches!(result, Err(GatewayError::Cancelled)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_dropped_connect_publishes_cancelled() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);

        let attempt = manager.connect(ScriptedConnector::STALL, 45000, TIMEOUT);
        let outcome = tokio::time::timeout(Duration::from_millis(20), attempt).await;
        assert!(outcome.is_err());
        assert_eq!(manager.state(), ConnectionState::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_dropped_while_waiting_for_exchange() {
        let manager = ConnectionManager::new(
            ScriptedConnector::new(|_, _| Reply::Raw(Vec::new())),
            ChecksumPolicy::Warn,
        );
        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();
        let frame = CommandFrame::new(0x50u8, &[]).unwrap();

        let (result, ()) = tokio::join!(manager.request(&frame, TIMEOUT), async {
            tokio::task::yield_now().await;
            let attempt = manager.connect("gateway", 45001, TIMEOUT);
            assert!(tokio::time::timeout(Duration::from_millis(50), attempt).await.is_err());
            assert_eq!(manager.state(), ConnectionState::Cancelled);
            assert!(!manager.is_connected());
        });

        assert!(matches!(result, Err(GatewayError::Timeout { received: 0 })));
        assert_eq!(manager.state(), ConnectionState::Cancelled);
        assert!(matches!(
            manager.request(&frame, TIMEOUT).await,
            Err(GatewayError::NotConnected)
        ));
        assert!(manager.statistics().await.is_none());
    }

    #[tokio::test]
    async fn test_partial_reply_timeout_marks_failed() {
        let manager = ConnectionManager::new(
            ScriptedConnector::new(|_, _| Reply::Raw(vec![0xFF, 0xFF, 0x50])),
            ChecksumPolicy::Warn,
        );
        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();

        let frame = CommandFrame::new(0x50u8, &[]).unwrap();
        let result = manager.request(&frame, Duration::from_millis(50)).await;
        assert!(matches!(result, Err(GatewayError::Timeout { received: 3 })));
        assert_eq!(manager.state(), ConnectionState::Failed(DESYNCHRONIZED.to_string()));
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_is_immediate() {
        let manager = ConnectionManager::new(ScriptedConnector::new(firmware_reply), ChecksumPolicy::Warn);
        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();

        manager.disconnect().await;
        assert!(!manager.is_connected());
        assert!(manager.statistics().await.is_none());

        let frame = CommandFrame::new(0x50u8, &[]).unwrap();
        assert!(matches!(
            manager.request(&frame, TIMEOUT).await,
            Err(GatewayError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_remote_close_marks_failed() {
        let manager = ConnectionManager::new(
            ScriptedConnector::new(|_, _| Reply::Close),
            ChecksumPolicy::Warn,
        );
        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();

        let frame = CommandFrame::new(0x3Du8, &[]).unwrap();
        let result = manager.request(&frame, TIMEOUT).await;
        assert!(matches!(result, Err(GatewayError::IncompleteHeader { received: 0 })));
        assert_eq!(manager.state(), ConnectionState::Failed(REMOTE_CLOSED.to_string()));
        assert!(!manager.is_ready());
        assert_eq!(manager.status().last_error_kind, Some(ErrorKind::IncompleteResponse));
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let connector = ScriptedConnector::new(firmware_reply);
        let connects = connector.connect_count();
        let manager = ConnectionManager::new(connector, ChecksumPolicy::Warn);

        manager.connect("gateway", 45000, TIMEOUT).await.unwrap();
        let frame = CommandFrame::new(0x50u8, &[]).unwrap();
        manager.request(&frame, TIMEOUT).await.unwrap();

        manager.connect("gateway", 45001, TIMEOUT).await.unwrap();
        assert_eq!(connects.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(manager.statistics().await.unwrap().frames_sent, 0);
        assert_eq!(manager.endpoint().as_deref(), Some("gateway:45001"));
    }
}
