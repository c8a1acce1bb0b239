//! Latency sample window.

/// Append-only window of round-trip latency samples.
///
/// Samples accumulate for the lifetime of a session; the mean is taken
/// over everything recorded so far. Negative samples (clock anomalies)
/// are clamped to zero rather than rejected, so the sample count always
/// matches the number of results observed.
#[derive(Debug, Default)]
pub struct LatencyWindow {
    samples: Vec<f64>,
}

impl LatencyWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one round-trip latency in milliseconds
    pub fn record(&mut self, latency_ms: f64) {
        self.samples.push(latency_ms.max(0.0));
    }

    /// Mean over all recorded samples, or 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Most recently recorded sample
    pub fn last(&self) -> Option<f64> {
        self.samples.last().copied()
    }

    /// All recorded samples, oldest first
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
