//! Connection state machine vocabulary.
//!
//! Owned exclusively by the channel supervisor; everyone else observes it
//! through a watch channel and never writes it.

use serde::{Deserialize, Serialize};

/// Logical state of the bidirectional channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and no handshake in progress
    #[default]
    Disconnected,
    /// Handshake in flight, or waiting out the fixed delay between
    /// reconnection attempts
    Connecting,
    /// Handshake completed; sends are forwarded to the transport
    Connected,
}

impl ConnectionState {
    /// True only in the Connected state
    pub fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}
