use crate::audio::dropout_fraction;
use crate::error::{Result, StreamError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable per-recording play record.
///
/// Field names follow the on-disk JSON layout (`segment_*` for regions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingRecord {
    /// Recording identifier (the audio file name)
    pub filename: String,

    /// Display title
    pub title: String,

    /// Total duration in seconds
    pub duration: f64,

    /// Region duration in seconds, fixed at creation
    pub segment_duration: f64,

    /// Number of regions
    pub total_segments: usize,

    /// Play count per region, in region order
    pub segment_play_counts: Vec<u64>,

    /// When the record was first created
    pub created_at: DateTime<Utc>,

    /// Cumulative number of listener sessions
    #[serde(default)]
    pub total_streams: u64,
}

impl RecordingRecord {
    /// Zero-initialized record for a newly discovered recording.
    ///
    /// `total_segments` comes from the recording's own frame layout, never from
    /// `duration / segment_duration`, which can round differently.
    pub fn new(
        filename: impl Into<String>,
        title: impl Into<String>,
        duration: f64,
        segment_duration: f64,
        total_segments: usize,
    ) -> Self {
        Self {
            filename: filename.into(),
            title: title.into(),
            duration,
            segment_duration,
            total_segments,
            segment_play_counts: vec![0; total_segments],
            created_at: Utc::now(),
            total_streams: 0,
        }
    }

    /// Reject records whose shape does not hold together
    pub fn validate(&self) -> Result<()> {
        if self.segment_play_counts.len() != self.total_segments {
            return Err(StreamError::Ledger(format!(
                "{}: {} play counts for {} regions",
                self.filename,
                self.segment_play_counts.len(),
                self.total_segments
            )));
        }
        if !(self.segment_duration > 0.0) {
            return Err(StreamError::Ledger(format!(
                "{}: region duration {} is not positive",
                self.filename, self.segment_duration
            )));
        }
        Ok(())
    }

    /// Mean over all regions of `min(play_count, 100)`, as a percentage.
    ///
    /// At a decay rate of 1% per play this is the mean dropout fraction × 100.
    pub fn aggregate_degradation(&self) -> f64 {
        if self.segment_play_counts.is_empty() {
            return 0.0;
        }
        let total: u64 = self.segment_play_counts.iter().map(|&c| c.min(100)).sum();
        total as f64 / self.segment_play_counts.len() as f64
    }

    /// Resize to `total_segments` regions, keeping the counts of regions that survive
    pub fn resize_regions(&mut self, total_segments: usize) {
        self.segment_play_counts.resize(total_segments, 0);
        self.total_segments = total_segments;
    }

    /// Per-region view with derived times and dropout
    pub fn regions(&self, decay_rate: f64) -> Vec<RegionStats> {
        self.segment_play_counts
            .iter()
            .enumerate()
            .map(|(index, &play_count)| {
                let start_secs = index as f64 * self.segment_duration;
                RegionStats {
                    index,
                    start_secs,
                    end_secs: (start_secs + self.segment_duration).min(self.duration),
                    play_count,
                    dropout: dropout_fraction(play_count, decay_rate),
                }
            })
            .collect()
    }
}

/// One region as reported by the stats surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionStats {
    pub index: usize,
    pub start_secs: f64,
    pub end_secs: f64,
    pub play_count: u64,
    pub dropout: f64,
}
