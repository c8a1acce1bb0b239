//! Channel supervisor and client handle.

use std::time::Duration;

use contracts::{
    ChannelConfig, ClientError, ConnectionState, WireEnvelope, EVENT_CONNECT, EVENT_CONNECT_ERROR,
    EVENT_DISCONNECT,
};
use metrics::counter;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::registry::{EventRegistry, SubscriptionId};
use crate::transport::{Connection, Transport};

/// Reconnection policy for the supervisor
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Reconnect attempts after a failure before giving up
    pub max_reconnect_attempts: u32,
    /// Fixed delay between attempts
    pub reconnect_delay: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(2000),
        }
    }
}

impl From<&ChannelConfig> for ChannelOptions {
    fn from(config: &ChannelConfig) -> Self {
        Self {
            max_reconnect_attempts: config.max_reconnect_attempts,
            reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
        }
    }
}

enum Command {
    Connect,
    Disconnect,
    Send(WireEnvelope),
}

/// Client surface of a running channel.
///
/// Cheap to clone; all clones talk to the same supervisor.
#[derive(Clone)]
pub struct ChannelHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    registry: Arc<EventRegistry>,
    state_rx: watch::Receiver<ConnectionState>,
}

impl ChannelHandle {
    /// Request a connection. No-op while connecting or connected.
    pub fn connect(&self) {
        if *self.state_rx.borrow() != ConnectionState::Disconnected {
            debug!("connect ignored, channel is not disconnected");
            return;
        }
        if self.cmd_tx.send(Command::Connect).is_err() {
            error!("channel supervisor is gone");
        }
    }

    /// Request a clean disconnect. Cancels any pending reconnect.
    pub fn disconnect(&self) {
        let _ = self.cmd_tx.send(Command::Disconnect);
    }

    /// Best-effort send.
    ///
    /// When the channel is not connected the envelope is dropped with a
    /// warning and `false` is returned. Nothing is queued for later.
    pub fn send(&self, event: &str, data: Value) -> bool {
        if *self.state_rx.borrow() != ConnectionState::Connected {
            counter!("annostream_sends_dropped_total").increment(1);
            warn!(event, "channel not connected, message dropped");
            return false;
        }
        if self
            .cmd_tx
            .send(Command::Send(WireEnvelope::new(event, data)))
            .is_err()
        {
            error!(event, "channel supervisor is gone, message dropped");
            return false;
        }
        true
    }

    /// Register a handler for an inbound event
    pub fn on<F>(&self, event: &str, handler: F) -> SubscriptionId
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.registry.on(event, handler)
    }

    /// Remove one handler, or all handlers for the event when `id` is None
    pub fn off(&self, event: &str, id: Option<SubscriptionId>) {
        self.registry.off(event, id);
    }

    /// Current connection state
    pub fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Watch connection state transitions
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }
}

/// Owns the supervisor task for one channel
pub struct ChannelManager {
    handle: ChannelHandle,
    task: JoinHandle<()>,
}

impl ChannelManager {
    /// Spawn the supervisor over a transport.
    ///
    /// The channel starts disconnected; call [`ChannelHandle::connect`].
    pub fn spawn<T: Transport>(transport: T, options: ChannelOptions) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let registry = Arc::new(EventRegistry::new());

        let task = tokio::spawn(supervise(
            transport,
            options,
            cmd_rx,
            Arc::clone(&registry),
            state_tx,
        ));

        Self {
            handle: ChannelHandle {
                cmd_tx,
                registry,
                state_rx,
            },
            task,
        }
    }

    /// Get a cloneable client handle
    pub fn handle(&self) -> ChannelHandle {
        self.handle.clone()
    }

    /// Disconnect and wait for the supervisor to exit.
    ///
    /// The supervisor stops once every other [`ChannelHandle`] clone has
    /// been dropped as well.
    #[instrument(name = "channel_shutdown", skip(self))]
    pub async fn shutdown(self) {
        self.handle.disconnect();
        drop(self.handle);
        if let Err(e) = self.task.await {
            error!(error = ?e, "channel supervisor panicked");
        }
        debug!("channel shutdown complete");
    }

    /// Whether the supervisor task has exited
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

enum SessionEnd {
    /// Disconnect requested by the client; do not reconnect
    ClientDisconnect,
    /// Every handle dropped; supervisor should exit
    HandlesDropped,
    /// Connection dropped unexpectedly; reconnect
    ConnectionLost(String),
}

#[instrument(name = "channel_supervisor", skip_all)]
async fn supervise<T: Transport>(
    transport: T,
    options: ChannelOptions,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    registry: Arc<EventRegistry>,
    state_tx: watch::Sender<ConnectionState>,
) {
    debug!("channel supervisor started");

    'idle: loop {
        // Disconnected: wait for a connect request
        match cmd_rx.recv().await {
            None => break,
            Some(Command::Connect) => {}
            Some(Command::Disconnect) => continue,
            Some(Command::Send(envelope)) => {
                counter!("annostream_sends_dropped_total").increment(1);
                warn!(event = %envelope.event, "channel not connected, message dropped");
                continue;
            }
        }

        let mut retries = 0u32;
        loop {
            let _ = state_tx.send(ConnectionState::Connecting);
            counter!("annostream_connect_attempts_total").increment(1);

            match transport.connect().await {
                Ok(mut conn) => {
                    retries = 0;
                    let _ = state_tx.send(ConnectionState::Connected);
                    info!("channel connected");
                    registry.dispatch(EVENT_CONNECT, Value::Null);

                    match run_session(&mut conn, &mut cmd_rx, &registry).await {
                        SessionEnd::ClientDisconnect => {
                            if let Err(e) = conn.close().await {
                                debug!(error = %e, "close after disconnect failed");
                            }
                            let _ = state_tx.send(ConnectionState::Disconnected);
                            registry.dispatch(EVENT_DISCONNECT, json!("client disconnect"));
                            info!("channel disconnected by client");
                            continue 'idle;
                        }
                        SessionEnd::HandlesDropped => {
                            let _ = conn.close().await;
                            let _ = state_tx.send(ConnectionState::Disconnected);
                            break 'idle;
                        }
                        SessionEnd::ConnectionLost(reason) => {
                            // Dependents must not see Connected while the
                            // retry delay runs; sends in that gap are refused
                            let _ = state_tx.send(ConnectionState::Connecting);
                            registry.dispatch(EVENT_DISCONNECT, json!(reason.clone()));
                            warn!(reason = %reason, "connection lost");
                        }
                    }
                }
                Err(e) => {
                    registry.dispatch(EVENT_CONNECT_ERROR, json!(e.to_string()));
                    warn!(error = %e, "connection attempt failed");
                }
            }

            // Reconnect gate: bounded retries with a fixed delay
            if retries == options.max_reconnect_attempts {
                error!(
                    attempts = retries,
                    "reconnect attempts exhausted, giving up"
                );
                let _ = state_tx.send(ConnectionState::Disconnected);
                continue 'idle;
            }
            retries += 1;
            counter!("annostream_reconnects_total").increment(1);
            info!(
                attempt = retries,
                max = options.max_reconnect_attempts,
                delay_ms = options.reconnect_delay.as_millis() as u64,
                "reconnecting after delay"
            );

            let deadline = Instant::now() + options.reconnect_delay;
            loop {
                tokio::select! {
                    _ = sleep_until(deadline) => break,
                    cmd = cmd_rx.recv() => match cmd {
                        None => break 'idle,
                        Some(Command::Disconnect) => {
                            let _ = state_tx.send(ConnectionState::Disconnected);
                            info!("reconnect cancelled by client");
                            continue 'idle;
                        }
                        // Already reconnecting
                        Some(Command::Connect) => {}
                        Some(Command::Send(envelope)) => {
                            counter!("annostream_sends_dropped_total").increment(1);
                            warn!(event = %envelope.event, "channel not connected, message dropped");
                        }
                    },
                }
            }
        }
    }

    debug!("channel supervisor stopped");
}

enum Step {
    Cmd(Option<Command>),
    Inbound(Option<Result<WireEnvelope, ClientError>>),
}

async fn run_session<C: Connection>(
    conn: &mut C,
    cmd_rx: &mut mpsc::UnboundedReceiver<Command>,
    registry: &EventRegistry,
) -> SessionEnd {
    loop {
        let step = tokio::select! {
            cmd = cmd_rx.recv() => Step::Cmd(cmd),
            inbound = conn.recv() => Step::Inbound(inbound),
        };

        match step {
            Step::Cmd(None) => return SessionEnd::HandlesDropped,
            Step::Cmd(Some(Command::Disconnect)) => return SessionEnd::ClientDisconnect,
            Step::Cmd(Some(Command::Connect)) => {
                debug!("connect ignored, already connected");
            }
            Step::Cmd(Some(Command::Send(envelope))) => {
                if let Err(e) = conn.send(&envelope).await {
                    return SessionEnd::ConnectionLost(e.to_string());
                }
                counter!("annostream_messages_sent_total").increment(1);
            }
            Step::Inbound(None) => {
                return SessionEnd::ConnectionLost("connection closed by peer".to_string());
            }
            Step::Inbound(Some(Ok(envelope))) => {
                counter!("annostream_messages_received_total").increment(1);
                registry.dispatch(&envelope.event, envelope.data);
            }
            Step::Inbound(Some(Err(e))) => {
                // Malformed message on a healthy connection: skip it
                warn!(error = %e, "malformed inbound message ignored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use contracts::EVENT_BOUNDING_BOX;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::{sleep, timeout};

    fn fast_options() -> ChannelOptions {
        ChannelOptions {
            max_reconnect_attempts: 2,
            reconnect_delay: Duration::from_millis(20),
        }
    }

    async fn wait_for_state(handle: &ChannelHandle, expected: ConnectionState) {
        let mut rx = handle.state_changes();
        timeout(Duration::from_secs(1), async {
            while *rx.borrow() != expected {
                rx.changed().await.expect("supervisor gone");
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {expected}"));
    }

    #[tokio::test]
    async fn test_connect_reaches_connected() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;
        assert_eq!(transport.connect_attempts(), 1);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_while_disconnected_drops() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        assert!(!handle.send("frame", json!({"frame": "abc"})));
        assert_eq!(transport.sent_count(), 0);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_send_after_connect_delivers() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        assert!(handle.send("frame", json!({"frame": "abc"})));
        sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(transport.sent()[0].event, "frame");

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_inbound_event_reaches_handler() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        let hits = Arc::new(AtomicU32::new(0));
        let h = Arc::clone(&hits);
        handle.on(EVENT_BOUNDING_BOX, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        transport.inject(WireEnvelope::new(EVENT_BOUNDING_BOX, json!({"x": 1})));
        sleep(Duration::from_millis(20)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_lost_connection_leaves_connected_before_retry_delay() {
        let transport = MockTransport::new();
        let options = ChannelOptions {
            max_reconnect_attempts: 5,
            reconnect_delay: Duration::from_millis(300),
        };
        let manager = ChannelManager::spawn(transport.clone(), options);
        let handle = manager.handle();

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        transport.drop_connection();
        wait_for_state(&handle, ConnectionState::Connecting).await;

        // Mid-delay sends are refused instead of vanishing in the supervisor
        let before = transport.sent_count();
        assert!(!handle.send("frame", json!({"frame": "abc"})));
        sleep(Duration::from_millis(20)).await;
        assert_eq!(transport.sent_count(), before);

        wait_for_state(&handle, ConnectionState::Connected).await;

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_unexpected_drop_triggers_reconnect() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        transport.drop_connection();
        sleep(Duration::from_millis(100)).await;
        assert_eq!(handle.state(), ConnectionState::Connected);
        assert_eq!(transport.connect_attempts(), 2);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnect_gives_up_after_max_attempts() {
        let transport = MockTransport::always_failing();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        handle.connect();
        // Initial attempt plus two retries, then nothing more
        timeout(Duration::from_secs(1), async {
            while transport.connect_attempts() < 3 {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("retries never exhausted");

        sleep(Duration::from_millis(200)).await;
        assert_eq!(transport.connect_attempts(), 3);
        assert_eq!(handle.state(), ConnectionState::Disconnected);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_double_connect_single_handshake() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;
        handle.connect();
        sleep(Duration::from_millis(50)).await;

        assert_eq!(transport.connect_attempts(), 1);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_client_disconnect_is_final() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport.clone(), fast_options());
        let handle = manager.handle();

        let disconnects = Arc::new(AtomicU32::new(0));
        let d = Arc::clone(&disconnects);
        handle.on(EVENT_DISCONNECT, move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        });

        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        handle.disconnect();
        wait_for_state(&handle, ConnectionState::Disconnected).await;
        sleep(Duration::from_millis(100)).await;

        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        // No reconnect after a clean disconnect
        assert_eq!(transport.connect_attempts(), 1);

        drop(handle);
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_finishes_supervisor() {
        let transport = MockTransport::new();
        let manager = ChannelManager::spawn(transport, fast_options());
        let handle = manager.handle();
        handle.connect();
        wait_for_state(&handle, ConnectionState::Connected).await;

        drop(handle);
        manager.shutdown().await;
    }
}
