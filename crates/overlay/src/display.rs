//! Display sinks.

use std::sync::Mutex;

use contracts::{DisplaySink, DisplayUpdate};
use tracing::info;

/// Writes each display update to the log
#[derive(Debug, Default)]
pub struct LogDisplay;

impl LogDisplay {
    pub fn new() -> Self {
        Self
    }
}

impl DisplaySink for LogDisplay {
    fn update(&self, update: &DisplayUpdate) {
        info!(
            latency = %update.latency_line,
            geometry = %update.geometry_line,
            orientation = %update.orientation,
            user_text = %update.text_for_user,
            face_distance = %update.text_face_distance,
            camera = %update.camera_line,
            "display updated"
        );
    }
}

/// Collects display updates in memory, for tests and dry runs
#[derive(Debug, Default)]
pub struct BufferDisplay {
    updates: Mutex<Vec<DisplayUpdate>>,
}

impl BufferDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all updates so far
    pub fn updates(&self) -> Vec<DisplayUpdate> {
        self.updates.lock().expect("display lock poisoned").clone()
    }

    pub fn last(&self) -> Option<DisplayUpdate> {
        self.updates
            .lock()
            .expect("display lock poisoned")
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.updates.lock().expect("display lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DisplaySink for BufferDisplay {
    fn update(&self, update: &DisplayUpdate) {
        self.updates
            .lock()
            .expect("display lock poisoned")
            .push(update.clone());
    }
}
