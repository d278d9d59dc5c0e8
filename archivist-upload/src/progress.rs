use parking_lot::Mutex;

/// Receives percentage updates during a multipart transfer.
///
/// Only the multipart path reports progress; a single put has no
/// intermediate state to show.
pub trait ProgressReporter: Send + Sync {
    /// Replace the previous status with `percent` (0-100)
    fn update(&self, percent: u8);

    /// Remove the status once all parts are sent (or the loop gave up)
    fn clear(&self);
}

/// `floor(transferred * 100 / total)`, capped at 100
pub fn percent(transferred: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let value = (transferred as u128 * 100) / total as u128;
    value.min(100) as u8
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn update(&self, _percent: u8) {}

    fn clear(&self) {}
}

/// Keeps every update in order. Useful for tests and for callers that render later.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<u8>>,
    cleared: Mutex<bool>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<u8> {
        self.updates.lock().clone()
    }

    pub fn was_cleared(&self) -> bool {
        *self.cleared.lock()
    }
}

impl ProgressReporter for RecordingProgress {
    fn update(&self, percent: u8) {
        self.updates.lock().push(percent);
    }

    fn clear(&self) {
        *self.cleared.lock() = true;
    }
}
