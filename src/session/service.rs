use super::config::StreamConfig;
use super::session::ListenerSession;
use super::stats::{RecordingStats, RecordingSummary};
use crate::catalog::Library;
use crate::error::{Result, StreamError};
use crate::ledger::PlayLedger;
use crate::locks::RegionLocks;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Entry point for listener sessions and read-only reporting.
///
/// Built once at startup from explicitly constructed services; tests build
/// their own isolated instances.
#[derive(Clone)]
pub struct StreamService {
    library: Arc<Library>,
    locks: RegionLocks,
    ledger: Arc<PlayLedger>,
    config: StreamConfig,
}

impl StreamService {
    pub fn new(
        library: Arc<Library>,
        locks: RegionLocks,
        ledger: Arc<PlayLedger>,
        config: StreamConfig,
    ) -> Self {
        Self {
            library,
            locks,
            ledger,
            config,
        }
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn ledger(&self) -> &Arc<PlayLedger> {
        &self.ledger
    }

    pub fn locks(&self) -> &RegionLocks {
        &self.locks
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Validate a request and start a session at `start_offset_secs`
    pub async fn open_session(
        &self,
        recording_id: &str,
        start_offset_secs: f64,
    ) -> Result<ListenerSession> {
        self.open_session_with_cancel(recording_id, start_offset_secs, CancellationToken::new())
            .await
    }

    /// Like [`open_session`](Self::open_session) with a caller-owned cancellation token
    pub async fn open_session_with_cancel(
        &self,
        recording_id: &str,
        start_offset_secs: f64,
        cancel: CancellationToken,
    ) -> Result<ListenerSession> {
        // Files added or broken since the last scan are opened here so the
        // caller sees `Format` rather than `NotFound` for a corrupt recording
        let file = self
            .library
            .get_or_register(recording_id, &self.ledger)
            .await?;
        if !self.ledger.contains(recording_id) {
            return Err(StreamError::not_found(recording_id));
        }

        if !start_offset_secs.is_finite() || start_offset_secs < 0.0 {
            return Err(StreamError::invalid(format!(
                "start offset must be a non-negative number of seconds, got {}",
                start_offset_secs
            )));
        }

        let region_count = file.region_count();
        let first_region = (start_offset_secs / file.region_duration).floor() as usize;
        if first_region >= region_count {
            return Err(StreamError::invalid(format!(
                "start offset {:.3}s is past the end of {} ({:.3}s)",
                start_offset_secs, recording_id, file.duration_seconds
            )));
        }

        if let Err(e) = self.ledger.record_session(recording_id).await {
            warn!("Could not count session for {}: {}", recording_id, e);
        }

        Ok(ListenerSession::new(
            recording_id.to_string(),
            file,
            self.locks.clone(),
            Arc::clone(&self.ledger),
            self.config.clone(),
            cancel,
            first_region,
            region_count,
        ))
    }

    /// Every known recording with its aggregate wear
    pub fn listing(&self) -> Vec<RecordingSummary> {
        self.library
            .ids()
            .into_iter()
            .filter_map(|id| match self.ledger.snapshot(&id) {
                Ok(record) => Some(RecordingSummary {
                    overall_degradation: record.aggregate_degradation(),
                    filename: record.filename,
                    title: record.title,
                    duration: record.duration,
                    total_streams: record.total_streams,
                }),
                Err(e) => {
                    warn!("No play record for {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Per-region play counts for one recording
    pub fn stats(&self, recording_id: &str) -> Result<RecordingStats> {
        let record = self.ledger.snapshot(recording_id)?;
        Ok(RecordingStats {
            overall_degradation: record.aggregate_degradation(),
            filename: record.filename,
            title: record.title,
            duration: record.duration,
            segment_duration: record.segment_duration,
            total_segments: record.total_segments,
            segment_play_counts: record.segment_play_counts,
            total_streams: record.total_streams,
            created_at: record.created_at,
        })
    }
}
