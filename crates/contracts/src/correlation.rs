//! Single-slot send/result correlation.
//!
//! The scheduler stamps this slot on every send; the correlator reads it on
//! every inbound result. Last-write-wins, never cleared on read: at most one
//! outstanding round-trip is tracked, and a late result is matched against
//! whichever stamp is current when it arrives.

use std::sync::Mutex;
use std::time::Instant;

/// Shared "last outstanding send time" slot
#[derive(Debug, Default)]
pub struct SendSlot {
    inner: Mutex<Option<Instant>>,
}

impl SendSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the slot with a new send stamp
    pub fn stamp(&self, sent_at: Instant) {
        *self.inner.lock().unwrap() = Some(sent_at);
    }

    /// Read the current stamp without clearing it
    pub fn last_send(&self) -> Option<Instant> {
        *self.inner.lock().unwrap()
    }
}
