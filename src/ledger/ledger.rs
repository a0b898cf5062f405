use super::record::RecordingRecord;
use super::store::RecordStore;
use crate::error::{Result, StreamError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// In-memory view of one recording's record plus its persistence lock
struct LedgerEntry {
    /// Last durably saved version; only replaced after a successful save
    record: RwLock<RecordingRecord>,

    /// Serializes whole-record persistence so concurrent region updates
    /// never overwrite each other on disk
    persist: Mutex<()>,
}

/// Durable per-region play counts for every known recording
pub struct PlayLedger {
    store: Arc<dyn RecordStore>,

    /// Region duration given to newly created records
    region_duration: f64,

    entries: RwLock<HashMap<String, Arc<LedgerEntry>>>,
}

impl PlayLedger {
    pub fn new(store: Arc<dyn RecordStore>, region_duration: f64) -> Self {
        Self {
            store,
            region_duration,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn region_duration(&self) -> f64 {
        self.region_duration
    }

    /// Load the persisted record for a recording, or create a zeroed one with
    /// `region_count` regions.
    ///
    /// A loaded record keeps its own region layout; see
    /// [`reconcile_regions`](Self::reconcile_regions).
    pub async fn load_or_init(
        &self,
        recording_id: &str,
        duration: f64,
        title: &str,
        region_count: usize,
    ) -> Result<RecordingRecord> {
        let existing = self.entries.read().get(recording_id).cloned();
        if let Some(entry) = existing {
            let record = entry.record.read().clone();
            return Ok(record);
        }

        let record = match self.store.load(recording_id).await? {
            Some(record) => {
                record.validate()?;
                info!(
                    "Loaded play record for {} ({} regions, {} sessions)",
                    recording_id, record.total_segments, record.total_streams
                );
                record
            }
            None => {
                let record = RecordingRecord::new(
                    recording_id,
                    title,
                    duration,
                    self.region_duration,
                    region_count,
                );
                match self.store.save(&record).await {
                    Ok(()) => info!(
                        "Initialized play record for {} ({} regions)",
                        recording_id, record.total_segments
                    ),
                    Err(e) => warn!(
                        "Could not persist new play record for {}: {}",
                        recording_id, e
                    ),
                }
                record
            }
        };

        // Another caller may have raced us here; the first insert wins
        let mut entries = self.entries.write();
        let entry = entries
            .entry(recording_id.to_string())
            .or_insert_with(|| {
                Arc::new(LedgerEntry {
                    record: RwLock::new(record),
                    persist: Mutex::new(()),
                })
            });
        let snapshot = entry.record.read().clone();
        Ok(snapshot)
    }

    fn entry(&self, recording_id: &str) -> Result<Arc<LedgerEntry>> {
        self.entries
            .read()
            .get(recording_id)
            .cloned()
            .ok_or_else(|| StreamError::not_found(recording_id))
    }

    pub fn contains(&self, recording_id: &str) -> bool {
        self.entries.read().contains_key(recording_id)
    }

    /// Ids of every recording the ledger knows, sorted
    pub fn recordings(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Copy of the current record; never waits on persistence
    pub fn snapshot(&self, recording_id: &str) -> Result<RecordingRecord> {
        let entry = self.entry(recording_id)?;
        let record = entry.record.read().clone();
        Ok(record)
    }

    pub fn play_count(&self, recording_id: &str, region_index: usize) -> Result<u64> {
        let entry = self.entry(recording_id)?;
        let record = entry.record.read();
        record
            .segment_play_counts
            .get(region_index)
            .copied()
            .ok_or_else(|| region_out_of_range(&record, region_index))
    }

    /// Mean of `min(play_count, 100)` over all regions
    pub fn aggregate_degradation(&self, recording_id: &str) -> Result<f64> {
        Ok(self.snapshot(recording_id)?.aggregate_degradation())
    }

    /// Add one play to a region and persist it.
    ///
    /// The caller must hold the region's lock. If the record cannot be saved the
    /// count is left where it was and the error returned.
    pub async fn increment_region_play(
        &self,
        recording_id: &str,
        region_index: usize,
    ) -> Result<u64> {
        let record = self
            .mutate(recording_id, |record| {
                if region_index >= record.segment_play_counts.len() {
                    return Err(region_out_of_range(record, region_index));
                }
                record.segment_play_counts[region_index] += 1;
                Ok(())
            })
            .await?;
        Ok(record.segment_play_counts[region_index])
    }

    /// Make a record's region count match the recording it describes.
    ///
    /// Counts of regions that still exist are kept; extra regions are dropped and
    /// missing ones start at zero. Nothing is written when the counts agree.
    pub async fn reconcile_regions(
        &self,
        recording_id: &str,
        region_count: usize,
    ) -> Result<RecordingRecord> {
        let current = self.snapshot(recording_id)?;
        if current.total_segments == region_count {
            return Ok(current);
        }

        warn!(
            "Play record for {} has {} regions, recording has {}; resizing",
            recording_id, current.total_segments, region_count
        );
        self.mutate(recording_id, |record| {
            record.resize_regions(region_count);
            Ok(())
        })
        .await
    }

    /// Count one more listener session for a recording
    pub async fn record_session(&self, recording_id: &str) -> Result<u64> {
        let record = self
            .mutate(recording_id, |record| {
                record.total_streams += 1;
                Ok(())
            })
            .await?;
        Ok(record.total_streams)
    }

    /// Apply a change to a copy, save it, then publish it in memory
    async fn mutate<F>(&self, recording_id: &str, change: F) -> Result<RecordingRecord>
    where
        F: FnOnce(&mut RecordingRecord) -> Result<()>,
    {
        let entry = self.entry(recording_id)?;
        let _persist = entry.persist.lock().await;

        let mut next = entry.record.read().clone();
        change(&mut next)?;

        self.store.save(&next).await?;

        *entry.record.write() = next.clone();
        Ok(next)
    }
}

fn region_out_of_range(record: &RecordingRecord, region_index: usize) -> StreamError {
    StreamError::invalid(format!(
        "region {} out of range for {} ({} regions)",
        region_index, record.filename, record.total_segments
    ))
}
