//! Wire protocol: named events and their payloads.
//!
//! Every message on the channel is one JSON envelope `{event, data}`.
//! Application events are `"frame"` (outbound) and `"bounding_box"` (inbound);
//! `connect` / `disconnect` / `connect_error` are lifecycle events synthesized
//! by the channel manager, never sent on the wire by this client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event carrying one encoded frame
pub const EVENT_FRAME: &str = "frame";

/// Inbound event carrying one annotation result
pub const EVENT_BOUNDING_BOX: &str = "bounding_box";

/// Lifecycle: handshake completed
pub const EVENT_CONNECT: &str = "connect";

/// Lifecycle: connection ended, payload is the reason string
pub const EVENT_DISCONNECT: &str = "disconnect";

/// Lifecycle: handshake failed, payload is the error string
pub const EVENT_CONNECT_ERROR: &str = "connect_error";

/// Tagged wire message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEnvelope {
    /// Event name
    pub event: String,

    /// Opaque payload, interpreted per event
    #[serde(default)]
    pub data: Value,
}

impl WireEnvelope {
    /// Build an envelope from a name and payload
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}

/// Payload of the outbound `frame` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    /// Base64-encoded JPEG bytes of the downsampled frame
    pub frame: String,
}

/// Payload of the inbound `bounding_box` event
///
/// Field names follow the remote service's wire format. Immutable once
/// received; wholly superseded by the next result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    /// Left edge in capture-target coordinates
    pub x: i32,

    /// Top edge in capture-target coordinates
    pub y: i32,

    /// Box width
    pub w: u32,

    /// Box height
    pub h: u32,

    /// Stroke color as an RGB triple
    #[serde(rename = "colorRectangle")]
    pub color: [u8; 3],

    /// Detected orientation label
    #[serde(default)]
    pub orientation: String,

    /// Primary user-facing message
    #[serde(rename = "text4User", default)]
    pub text_for_user: String,

    /// Secondary message (face/distance detail)
    #[serde(rename = "textFacDis", default)]
    pub text_face_distance: String,
}
