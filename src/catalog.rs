//! Recording catalog
//!
//! Discovers WAV files in the audio directory, opens them for region access and
//! makes sure the play ledger has a record for each one. Files that fail to
//! open are logged and left out; they never stop the service.

use crate::audio::RegionFile;
use crate::error::{Result, StreamError};
use crate::ledger::PlayLedger;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one directory scan
#[derive(Debug, Default, Clone)]
pub struct ScanReport {
    /// Recordings registered by this scan
    pub added: Vec<String>,
    /// Files that could not be opened, with the reason
    pub skipped: Vec<(String, String)>,
}

/// Open recordings keyed by id (the file name inside the audio directory)
pub struct Library {
    audio_dir: PathBuf,
    region_duration: f64,
    recordings: RwLock<HashMap<String, Arc<RegionFile>>>,
}

impl Library {
    pub fn new(audio_dir: impl Into<PathBuf>, region_duration: f64) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            region_duration,
            recordings: RwLock::new(HashMap::new()),
        }
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn get(&self, recording_id: &str) -> Option<Arc<RegionFile>> {
        self.recordings.read().get(recording_id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.recordings.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Open one file from the audio directory and register it with the ledger
    pub async fn register(&self, recording_id: &str, ledger: &PlayLedger) -> Result<Arc<RegionFile>> {
        if recording_id.is_empty()
            || recording_id.contains(['/', '\\'])
            || recording_id.starts_with('.')
        {
            return Err(StreamError::invalid(format!(
                "invalid recording id: {:?}",
                recording_id
            )));
        }

        let path = self.audio_dir.join(recording_id);
        let file = open_blocking(path.clone(), self.region_duration).await?;

        let title = Path::new(recording_id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| recording_id.to_string());

        let record = ledger
            .load_or_init(recording_id, file.duration_seconds, &title, file.region_count())
            .await?;

        // Region duration is fixed when the record is created
        let file = if (record.segment_duration - file.region_duration).abs() > f64::EPSILON {
            open_blocking(path, record.segment_duration).await?
        } else {
            file
        };

        // The file's frame layout is the authority on how many regions exist
        ledger
            .reconcile_regions(recording_id, file.region_count())
            .await?;

        Ok(self.insert(recording_id, file))
    }

    /// Known recording, or a fresh attempt to register it if the file exists.
    ///
    /// A file that is present but cannot be opened yields its open error
    /// (typically `Format`); an absent one yields `NotFound`.
    pub async fn get_or_register(
        &self,
        recording_id: &str,
        ledger: &PlayLedger,
    ) -> Result<Arc<RegionFile>> {
        if let Some(file) = self.get(recording_id) {
            return Ok(file);
        }

        let path = self.audio_dir.join(recording_id);
        let exists = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta.is_file(),
            Err(_) => false,
        };
        if !exists {
            return Err(StreamError::not_found(recording_id));
        }

        self.register(recording_id, ledger).await
    }

    /// Add an already opened recording under `recording_id`, replacing any previous one
    pub fn insert(&self, recording_id: &str, file: RegionFile) -> Arc<RegionFile> {
        let file = Arc::new(file);
        self.recordings
            .write()
            .insert(recording_id.to_string(), Arc::clone(&file));
        file
    }

    /// Register every `.wav` file in the audio directory not yet known
    pub async fn scan(&self, ledger: &PlayLedger) -> Result<ScanReport> {
        let mut report = ScanReport::default();

        tokio::fs::create_dir_all(&self.audio_dir).await?;
        let mut dir = tokio::fs::read_dir(&self.audio_dir).await?;

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_lowercase().ends_with(".wav") && entry.file_type().await?.is_file() {
                names.push(name);
            }
        }
        names.sort();

        for name in names {
            if self.get(&name).is_some() {
                continue;
            }
            match self.register(&name, ledger).await {
                Ok(_) => report.added.push(name),
                Err(e) => {
                    warn!("Skipping {}: {}", name, e);
                    report.skipped.push((name, e.to_string()));
                }
            }
        }

        info!(
            "Catalog scan of {}: {} added, {} skipped, {} total",
            self.audio_dir.display(),
            report.added.len(),
            report.skipped.len(),
            self.recordings.read().len()
        );

        Ok(report)
    }
}

async fn open_blocking(path: PathBuf, region_duration: f64) -> Result<RegionFile> {
    tokio::task::spawn_blocking(move || RegionFile::open(path, region_duration)).await?
}
