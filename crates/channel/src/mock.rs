//! In-process mock transport for tests and dry runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{ClientError, WireEnvelope};
use tokio::sync::mpsc;

use crate::transport::{Connection, Transport};

type ReplyFn = dyn Fn(&WireEnvelope) -> Option<WireEnvelope> + Send + Sync;

#[derive(Default)]
struct MockState {
    connect_attempts: AtomicU32,
    failures_remaining: AtomicU32,
    sent: Mutex<Vec<WireEnvelope>>,
    reply: Mutex<Option<Arc<ReplyFn>>>,
    inbound_tx: Mutex<Option<mpsc::UnboundedSender<WireEnvelope>>>,
}

/// Loopback transport with scripted failures.
///
/// Clones share state, so a test can keep one copy and hand another to the
/// channel supervisor: sent envelopes, connect attempts, injected inbound
/// traffic, and forced connection drops are all visible from the test side.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the first `failures` connect attempts
    pub fn failing(failures: u32) -> Self {
        let transport = Self::new();
        transport
            .state
            .failures_remaining
            .store(failures, Ordering::SeqCst);
        transport
    }

    /// Refuse every connect attempt
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    /// Auto-respond to outbound envelopes.
    ///
    /// Return `Some(envelope)` to loop a reply back as inbound traffic.
    pub fn set_reply<F>(&self, reply: F)
    where
        F: Fn(&WireEnvelope) -> Option<WireEnvelope> + Send + Sync + 'static,
    {
        *self.state.reply.lock().expect("mock lock poisoned") = Some(Arc::new(reply));
    }

    /// Total connect attempts observed, including refused ones
    pub fn connect_attempts(&self) -> u32 {
        self.state.connect_attempts.load(Ordering::SeqCst)
    }

    /// Envelopes sent over the current and past connections
    pub fn sent(&self) -> Vec<WireEnvelope> {
        self.state.sent.lock().expect("mock lock poisoned").clone()
    }

    pub fn sent_count(&self) -> usize {
        self.state.sent.lock().expect("mock lock poisoned").len()
    }

    /// Push an inbound envelope to the connected client.
    ///
    /// Returns false when no connection is live.
    pub fn inject(&self, envelope: WireEnvelope) -> bool {
        match self
            .state
            .inbound_tx
            .lock()
            .expect("mock lock poisoned")
            .as_ref()
        {
            Some(tx) => tx.send(envelope).is_ok(),
            None => false,
        }
    }

    /// Sever the live connection, as if the peer vanished
    pub fn drop_connection(&self) {
        self.state
            .inbound_tx
            .lock()
            .expect("mock lock poisoned")
            .take();
    }
}

impl Transport for MockTransport {
    type Conn = MockConnection;

    async fn connect(&self) -> Result<MockConnection, ClientError> {
        self.state.connect_attempts.fetch_add(1, Ordering::SeqCst);

        let remaining = self.state.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.state
                    .failures_remaining
                    .fetch_sub(1, Ordering::SeqCst);
            }
            return Err(ClientError::handshake("mock connect refused"));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *self.state.inbound_tx.lock().expect("mock lock poisoned") = Some(tx);
        Ok(MockConnection {
            state: Arc::clone(&self.state),
            inbound_rx: rx,
        })
    }
}

/// Connection half handed to the channel supervisor
pub struct MockConnection {
    state: Arc<MockState>,
    inbound_rx: mpsc::UnboundedReceiver<WireEnvelope>,
}

impl Connection for MockConnection {
    async fn send(&mut self, envelope: &WireEnvelope) -> Result<(), ClientError> {
        {
            let inbound = self.state.inbound_tx.lock().expect("mock lock poisoned");
            if inbound.is_none() {
                return Err(ClientError::channel_send("mock connection severed"));
            }
        }
        self.state
            .sent
            .lock()
            .expect("mock lock poisoned")
            .push(envelope.clone());

        let reply = self
            .state
            .reply
            .lock()
            .expect("mock lock poisoned")
            .clone();
        if let Some(reply) = reply {
            if let Some(response) = reply(envelope) {
                if let Some(tx) = self
                    .state
                    .inbound_tx
                    .lock()
                    .expect("mock lock poisoned")
                    .as_ref()
                {
                    let _ = tx.send(response);
                }
            }
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<WireEnvelope, ClientError>> {
        self.inbound_rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.state
            .inbound_tx
            .lock()
            .expect("mock lock poisoned")
            .take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_connect_and_send_records_envelopes() {
        let transport = MockTransport::new();
        let mut conn = transport.connect().await.unwrap();

        conn.send(&WireEnvelope::new("frame", json!({"frame": "abc"})))
            .await
            .unwrap();

        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.sent_count(), 1);
        assert_eq!(transport.sent()[0].event, "frame");
    }

    #[tokio::test]
    async fn test_failing_transport_refuses_then_accepts() {
        let transport = MockTransport::failing(2);
        assert!(transport.connect().await.is_err());
        assert!(transport.connect().await.is_err());
        assert!(transport.connect().await.is_ok());
        assert_eq!(transport.connect_attempts(), 3);
    }

    #[tokio::test]
    async fn test_reply_loops_back_as_inbound() {
        let transport = MockTransport::new();
        transport.set_reply(|envelope| {
            (envelope.event == "frame")
                .then(|| WireEnvelope::new("bounding_box", json!({"x": 1})))
        });

        let mut conn = transport.connect().await.unwrap();
        conn.send(&WireEnvelope::new("frame", json!({"frame": "abc"})))
            .await
            .unwrap();

        let inbound = conn.recv().await.unwrap().unwrap();
        assert_eq!(inbound.event, "bounding_box");
    }

    #[tokio::test]
    async fn test_drop_connection_ends_recv() {
        let transport = MockTransport::new();
        let mut conn = transport.connect().await.unwrap();
        transport.drop_connection();
        assert!(conn.recv().await.is_none());
    }
}
