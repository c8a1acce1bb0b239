//! # Channel
//!
//! Persistent bidirectional message channel to the inference service.
//!
//! A `ChannelManager` owns a supervisor task that drives the connection
//! lifecycle: connect on request, run the message session, and reconnect
//! with a fixed delay after unexpected drops, up to a bounded number of
//! attempts. All reconnection policy lives here; no other component
//! retries on its own.
//!
//! Cloneable `ChannelHandle`s provide the client surface: best-effort
//! `send`, event handler registration, and connection state observation.
//!
//! Transports are pluggable through the [`Transport`] trait:
//! - [`WsTransport`]: WebSocket JSON text frames (production)
//! - [`MockTransport`]: in-process loopback with failure injection (tests)

mod manager;
mod mock;
mod registry;
mod transport;
mod ws;

pub use manager::{ChannelHandle, ChannelManager, ChannelOptions};
pub use mock::{MockConnection, MockTransport};
pub use registry::{EventRegistry, SubscriptionId};
pub use transport::{Connection, Transport};
pub use ws::{WsConnection, WsTransport};
