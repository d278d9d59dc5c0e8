use std::time::{Duration, Instant};

/// Wall-clock duration of one transfer, measured on the monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct TransferTimer {
    started: Instant,
}

impl TransferTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Elapsed time in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        duration_ms(self.elapsed())
    }
}

pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
