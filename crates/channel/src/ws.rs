//! WebSocket transport.

use contracts::{ClientError, WireEnvelope};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::transport::{Connection, Transport};

/// WebSocket transport to a `ws://` or `wss://` endpoint.
///
/// Envelopes travel as JSON text frames.
#[derive(Debug, Clone)]
pub struct WsTransport {
    endpoint: String,
}

impl WsTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for WsTransport {
    type Conn = WsConnection;

    async fn connect(&self) -> Result<WsConnection, ClientError> {
        debug!(endpoint = %self.endpoint, "opening websocket");
        let (stream, response) = connect_async(&self.endpoint)
            .await
            .map_err(|e| ClientError::handshake(format!("websocket handshake failed: {e}")))?;
        debug!(status = %response.status(), "websocket established");
        Ok(WsConnection { stream })
    }
}

/// A live WebSocket connection
pub struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WsConnection {
    async fn send(&mut self, envelope: &WireEnvelope) -> Result<(), ClientError> {
        let text = serde_json::to_string(envelope)
            .map_err(|e| ClientError::channel_send(format!("envelope serialize failed: {e}")))?;
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| ClientError::channel_send(format!("websocket send failed: {e}")))
    }

    async fn recv(&mut self) -> Option<Result<WireEnvelope, ClientError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(&text).map_err(|e| {
                        ClientError::protocol(format!("malformed envelope: {e}"))
                    }));
                }
                // Tungstenite answers pings internally on the next flush
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => continue,
                Ok(Message::Binary(payload)) => {
                    trace!(len = payload.len(), "ignoring binary frame");
                    continue;
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "websocket closed by peer");
                    return None;
                }
                Ok(Message::Frame(_)) => continue,
                Err(e) => {
                    warn!(error = %e, "websocket read failed");
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), ClientError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ClientError::channel_closed(format!("websocket close failed: {e}")))
    }
}
