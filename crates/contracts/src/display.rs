//! DisplaySink trait - textual metrics collaborator
//!
//! Purely a sink: receives formatted lines, never feeds anything back.

/// One batch of display values, produced per annotation result
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayUpdate {
    /// Detected orientation ("N/A" when the service sent none)
    pub orientation: String,

    /// Primary user-facing message
    pub text_for_user: String,

    /// Secondary message (face/distance detail)
    pub text_face_distance: String,

    /// `Last=… ms, Avg=… ms`, three decimal places
    pub latency_line: String,

    /// `x: _, y: _, width: _, height: _`
    pub geometry_line: String,

    /// Resolution / frame rate / device id / label
    pub camera_line: String,
}

/// Text/metrics display collaborator
pub trait DisplaySink: Send + Sync {
    /// Present one update; implementations must not block
    fn update(&self, update: &DisplayUpdate);
}
