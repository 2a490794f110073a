//! Elapsed-time reporting for benches and stress tooling.

use std::time::{Duration, Instant};

/// A started stopwatch.
///
/// Not a correctness dependency of the containers; used by the bench and
/// stress paths to report the relative overhead of wrapped access.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Starts a stopwatch.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Operations per second for `ops` operations since start.
    #[allow(clippy::cast_precision_loss)]
    pub fn ops_per_sec(&self, ops: u64) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            ops as f64 / secs
        } else {
            f64::INFINITY
        }
    }
}
