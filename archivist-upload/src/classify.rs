use serde::{Deserialize, Serialize};

/// How a file is sent to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// One put carrying the whole body
    SingleShot,
    /// Initiate, upload parts, complete
    Multipart,
}

impl Strategy {
    /// Single-shot strictly below the threshold, multipart at or above it.
    pub fn for_size(size_bytes: u64, threshold: u64) -> Self {
        if size_bytes < threshold {
            Strategy::SingleShot
        } else {
            Strategy::Multipart
        }
    }
}

/// Number of parts a file of `size_bytes` splits into
pub fn part_count(size_bytes: u64, part_size: u64) -> u64 {
    if part_size == 0 {
        return 0;
    }
    size_bytes.div_ceil(part_size)
}
