use super::record::RecordingRecord;
use crate::error::{Result, StreamError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Durable storage for play records
///
/// Implementations:
/// - `JsonFileStore`: one pretty-printed JSON file per recording
/// - Tests may provide failing or in-memory stores
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load a record, `None` if it was never saved
    async fn load(&self, recording_id: &str) -> Result<Option<RecordingRecord>>;

    /// Persist a record, replacing any previous version
    async fn save(&self, record: &RecordingRecord) -> Result<()>;
}

/// Stores each record as `<file stem>.json` in a metadata directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a recording id ("song.wav" → "song.json")
    pub fn record_path(&self, recording_id: &str) -> PathBuf {
        let stem = Path::new(recording_id)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| recording_id.to_string());
        self.dir.join(format!("{}.json", stem))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn load(&self, recording_id: &str) -> Result<Option<RecordingRecord>> {
        let path = self.record_path(recording_id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record: RecordingRecord = serde_json::from_slice(&data)
            .map_err(|e| StreamError::Ledger(format!("{}: {}", path.display(), e)))?;
        Ok(Some(record))
    }

    async fn save(&self, record: &RecordingRecord) -> Result<()> {
        let path = self.record_path(&record.filename);
        let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        let payload = serde_json::to_vec_pretty(record)?;

        // Write aside and rename so a crash never leaves a truncated record
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(&payload).await?;
            file.sync_all().await?;
            tokio::fs::rename(&tmp, &path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!("Saved play record {}", path.display());
        Ok(())
    }
}
