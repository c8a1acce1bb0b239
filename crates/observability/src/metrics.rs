//! End-of-run metrics aggregation.
//!
//! Live counters and histograms are published where the events happen,
//! through the `metrics` facade; the aggregator here keeps an in-memory
//! copy for the end-of-run summary report.

/// In-memory aggregation for the end-of-run summary
#[derive(Debug, Clone, Default)]
pub struct RunMetricsAggregator {
    /// Frames handed to the channel
    pub frames_sent: u64,

    /// Annotation results received
    pub results_received: u64,

    /// Frames dropped while disconnected
    pub frames_dropped: u64,

    /// Reconnect attempts observed
    pub reconnects: u64,

    /// Round-trip latency statistics (ms)
    pub latency_stats: RunningStats,

    /// Frame rate changes applied by the controller
    pub rate_changes: u64,
}

impl RunMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_frame_sent(&mut self) {
        self.frames_sent += 1;
    }

    pub fn record_frame_dropped(&mut self) {
        self.frames_dropped += 1;
    }

    pub fn record_result(&mut self, latency_ms: Option<f64>) {
        self.results_received += 1;
        if let Some(latency_ms) = latency_ms {
            self.latency_stats.push(latency_ms);
        }
    }

    pub fn record_reconnect(&mut self) {
        self.reconnects += 1;
    }

    pub fn record_rate_change(&mut self) {
        self.rate_changes += 1;
    }

    /// Build the summary report
    pub fn summary(&self, final_fps: u32) -> RunSummary {
        RunSummary {
            frames_sent: self.frames_sent,
            results_received: self.results_received,
            frames_dropped: self.frames_dropped,
            reconnects: self.reconnects,
            rate_changes: self.rate_changes,
            final_fps,
            result_rate: if self.frames_sent > 0 {
                self.results_received as f64 / self.frames_sent as f64 * 100.0
            } else {
                0.0
            },
            latency_ms: LatencySummary::from(&self.latency_stats),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// End-of-run report
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub frames_sent: u64,
    pub results_received: u64,
    pub frames_dropped: u64,
    pub reconnects: u64,
    pub rate_changes: u64,
    pub final_fps: u32,
    pub result_rate: f64,
    pub latency_ms: LatencySummary,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Annotation Run Summary ===")?;
        writeln!(f, "Frames sent: {}", self.frames_sent)?;
        writeln!(
            f,
            "Results received: {} ({:.2}%)",
            self.results_received, self.result_rate
        )?;
        writeln!(f, "Frames dropped: {}", self.frames_dropped)?;
        writeln!(f, "Reconnects: {}", self.reconnects)?;
        writeln!(f, "Rate changes: {}", self.rate_changes)?;
        writeln!(f, "Final frame rate: {} fps", self.final_fps)?;
        writeln!(f, "Round trip (ms): {}", self.latency_ms)?;
        Ok(())
    }
}

/// Min/max/mean/std over the measured latencies
#[derive(Debug, Clone, Default)]
pub struct LatencySummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for LatencySummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
