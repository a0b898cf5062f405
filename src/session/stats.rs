use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a listener session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Start,
    Streaming,
    Completed,
    Aborted,
}

/// What one session did to the recording
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionReport {
    /// Regions emitted, in order
    pub regions_visited: Vec<usize>,

    /// Regions transformed, written back and counted
    pub regions_degraded: usize,

    /// Regions left worn on disk although their play could not be recorded
    pub regions_unrecorded: usize,

    /// Regions streamed untouched (lock timeout, failed write-back, or a play
    /// that could not be recorded and was rolled back on disk)
    pub regions_passed_through: usize,

    /// Regions replaced by silence because they could not be read
    pub regions_silenced: usize,

    /// Total bytes handed to the transport, header included
    pub bytes_emitted: u64,
}

/// One entry of the recording listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSummary {
    pub filename: String,
    pub title: String,
    pub duration: f64,
    pub overall_degradation: f64,
    pub total_streams: u64,
}

/// Detailed per-region statistics for one recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingStats {
    pub filename: String,
    pub title: String,
    pub duration: f64,
    pub segment_duration: f64,
    pub total_segments: usize,
    pub segment_play_counts: Vec<u64>,
    pub overall_degradation: f64,
    pub total_streams: u64,
    pub created_at: DateTime<Utc>,
}
