//! Pipeline statistics.

use std::time::Duration;

use observability::RunSummary;

/// Statistics from an annotation run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Aggregated run summary (frames, results, latency)
    pub summary: RunSummary,
}

impl PipelineStats {
    /// Effective outbound throughput in frames per second
    pub fn throughput_fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.frames_sent as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!();
        print!("{}", self.summary);
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Effective throughput: {:.2} fps", self.throughput_fps());
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throughput() {
        let mut stats = PipelineStats::default();
        stats.summary.frames_sent = 60;
        stats.duration = Duration::from_secs(2);
        assert!((stats.throughput_fps() - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_duration_throughput() {
        let stats = PipelineStats::default();
        assert_eq!(stats.throughput_fps(), 0.0);
    }
}
