use crate::locks::DEFAULT_LOCK_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings shared by every listener session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Dropout added per play, in percent of frames (1.0 = 1% per play)
    pub decay_rate: f64,

    /// How long a session waits for a region lock before streaming the
    /// region untouched
    pub lock_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            decay_rate: 1.0,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}
