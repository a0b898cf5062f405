// Shared fixtures for integration tests
//
// Recordings are synthesized with hound into a temporary directory so every
// test works on its own copy of the audio and its own play ledger.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use ephemeral_audio::error::StreamError;
use ephemeral_audio::{
    JsonFileStore, Library, PlayLedger, RecordStore, RecordingRecord, RegionFile, RegionLocks,
    StreamConfig, StreamService,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

pub const SAMPLE_RATE: u32 = 8000;
pub const REGION_SECS: f64 = 0.5;

/// Non-zero sample value for frame `n`, channel `c`
pub fn sample_at(n: u64, c: u16) -> i16 {
    ((n % 1000) as i16 + 1) * 10 + c as i16
}

/// Write a 16-bit PCM WAV with no silent samples
pub fn write_wav(path: &Path, seconds: f64, channels: u16) -> Result<u64> {
    let frames = (seconds * SAMPLE_RATE as f64).round() as u64;
    write_wav_frames(path, SAMPLE_RATE, frames, channels)
}

/// Same as [`write_wav`] with an explicit sample rate and frame count
pub fn write_wav_frames(path: &Path, sample_rate: u32, frames: u64, channels: u16) -> Result<u64> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for n in 0..frames {
        for c in 0..channels {
            writer.write_sample(sample_at(n, c))?;
        }
    }
    writer.finalize()?;
    Ok(frames)
}

/// Record store that can be switched to fail every save
pub struct FlakyStore {
    inner: JsonFileStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            inner: JsonFileStore::new(dir)?,
            failing: AtomicBool::new(false),
        })
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn load(&self, recording_id: &str) -> ephemeral_audio::error::Result<Option<RecordingRecord>> {
        self.inner.load(recording_id).await
    }

    async fn save(&self, record: &RecordingRecord) -> ephemeral_audio::error::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "No space left on device",
            )));
        }
        self.inner.save(record).await
    }
}

/// Isolated service instance over a temporary audio and metadata directory
pub struct Fixture {
    pub dir: TempDir,
    pub audio_dir: PathBuf,
    pub metadata_dir: PathBuf,
    pub ledger: Arc<PlayLedger>,
    pub library: Arc<Library>,
    pub service: StreamService,
}

impl Fixture {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let dir = TempDir::new()?;
        let store = JsonFileStore::new(dir.path().join("metadata"))?;
        Self::build(dir, Arc::new(store), config)
    }

    pub fn with_store(dir: TempDir, store: Arc<dyn RecordStore>, config: StreamConfig) -> Result<Self> {
        Self::build(dir, store, config)
    }

    fn build(dir: TempDir, store: Arc<dyn RecordStore>, config: StreamConfig) -> Result<Self> {
        let audio_dir = dir.path().join("audio");
        let metadata_dir = dir.path().join("metadata");
        std::fs::create_dir_all(&audio_dir)?;

        let ledger = Arc::new(PlayLedger::new(store, REGION_SECS));
        let library = Arc::new(Library::new(&audio_dir, REGION_SECS));
        let service = StreamService::new(
            Arc::clone(&library),
            RegionLocks::new(),
            Arc::clone(&ledger),
            config,
        );

        Ok(Self {
            dir,
            audio_dir,
            metadata_dir,
            ledger,
            library,
            service,
        })
    }

    /// Synthesize a recording and register it with the catalog and ledger
    pub async fn add_recording(&self, name: &str, seconds: f64, channels: u16) -> Result<Arc<RegionFile>> {
        write_wav(&self.audio_dir.join(name), seconds, channels)?;
        Ok(self.library.register(name, &self.ledger).await?)
    }

    pub fn audio_path(&self, name: &str) -> PathBuf {
        self.audio_dir.join(name)
    }

    pub fn play_counts(&self, name: &str) -> Result<Vec<u64>> {
        Ok(self.ledger.snapshot(name)?.segment_play_counts)
    }
}

/// Stream config with a short lock timeout for contention tests
pub fn quick_timeout(ms: u64) -> StreamConfig {
    StreamConfig {
        lock_timeout: std::time::Duration::from_millis(ms),
        ..StreamConfig::default()
    }
}
