//! Layered error definitions
//!
//! Categorized by source: config / channel / device / encode

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ClientError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Channel Errors =====
    /// Handshake with the remote endpoint failed
    #[error("channel handshake error: {message}")]
    Handshake { message: String },

    /// Connection dropped or was closed by the peer
    #[error("channel closed: {reason}")]
    ChannelClosed { reason: String },

    /// Outbound send failed on an established connection
    #[error("channel send error: {message}")]
    ChannelSend { message: String },

    /// Inbound message could not be decoded as a wire envelope
    #[error("wire protocol error: {message}")]
    Protocol { message: String },

    // ===== Device Errors =====
    /// Camera acquisition failed; capture never starts
    #[error("capture device error: {message}")]
    Device { message: String },

    // ===== Encode Errors =====
    /// Frame downsample/encode failed
    #[error("frame encode error: {message}")]
    Encode { message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create handshake error
    pub fn handshake(message: impl Into<String>) -> Self {
        Self::Handshake {
            message: message.into(),
        }
    }

    /// Create channel-closed error
    pub fn channel_closed(reason: impl Into<String>) -> Self {
        Self::ChannelClosed {
            reason: reason.into(),
        }
    }

    /// Create send error
    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    /// Create protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create device error
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }

    /// Create encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode {
            message: message.into(),
        }
    }
}
