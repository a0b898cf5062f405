use super::buffer::{SampleBuffer, SampleLayout};
use crate::error::{Result, StreamError};
use bytes::Bytes;
use hound::{SampleFormat, WavReader};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Segment-addressed access to the PCM payload of one WAV recording.
///
/// Container metadata is read once at open time. Each region read or write
/// opens the file, seeks to the region and performs a single read or write of
/// exactly the region's bytes, so concurrent readers only ever see a region
/// before or after a write, never a transform in progress.
#[derive(Debug, Clone)]
pub struct RegionFile {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub region_duration: f64,
    layout: SampleLayout,
    frame_count: u64,
    frames_per_region: u64,
    data_offset: u64,
    header: Bytes,
    writable: bool,
}

impl RegionFile {
    /// Open a recording, rejecting anything that is not uncompressed linear PCM.
    pub fn open(path: impl AsRef<Path>, region_duration: f64) -> Result<Self> {
        Self::open_with(path.as_ref(), region_duration, true)
    }

    /// Open a recording whose regions can be read but never rewritten.
    ///
    /// `write_region` fails with `PermissionDenied`, so sessions over it stream
    /// the stored bytes and record no plays.
    pub fn open_read_only(path: impl AsRef<Path>, region_duration: f64) -> Result<Self> {
        Self::open_with(path.as_ref(), region_duration, false)
    }

    fn open_with(path: &Path, region_duration: f64, writable: bool) -> Result<Self> {
        if !region_duration.is_finite() || region_duration <= 0.0 {
            return Err(StreamError::invalid(format!(
                "region duration must be positive, got {}",
                region_duration
            )));
        }

        debug!("Opening recording: {}", path.display());

        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        // hound stops reading right at the start of the data chunk
        let reader = WavReader::new(file)?;
        let spec = reader.spec();
        let declared_frames = reader.duration() as u64;
        let mut file = reader.into_inner();
        let data_offset = file.stream_position()?;

        let unsigned = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 8) => true,
            (SampleFormat::Int, 16 | 24 | 32) | (SampleFormat::Float, 32) => false,
            (format, bits) => {
                return Err(StreamError::format(format!(
                    "{}: unsupported sample format {:?} at {} bits",
                    path.display(),
                    format,
                    bits
                )))
            }
        };
        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(StreamError::format(format!(
                "{}: header declares {} channels at {} Hz",
                path.display(),
                spec.channels,
                spec.sample_rate
            )));
        }

        let layout = SampleLayout {
            channels: spec.channels,
            bytes_per_sample: spec.bits_per_sample / 8,
            unsigned,
        };

        // A truncated file may declare more data than it holds
        let available_frames = file_len.saturating_sub(data_offset) / layout.frame_bytes() as u64;
        let frame_count = declared_frames.min(available_frames);

        let mut header = vec![0u8; data_offset as usize];
        file.seek(SeekFrom::Start(0))?;
        file.read_exact(&mut header)?;

        let frames_per_region = ((spec.sample_rate as f64 * region_duration).round() as u64).max(1);
        let duration_seconds = frame_count as f64 / spec.sample_rate as f64;

        info!(
            "Recording opened: {} ({:.1}s, {}Hz, {} channels, {} bit, {} regions)",
            path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            frame_count.div_ceil(frames_per_region)
        );

        Ok(Self {
            path: path.to_path_buf(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            bits_per_sample: spec.bits_per_sample,
            region_duration,
            layout,
            frame_count,
            frames_per_region,
            data_offset,
            header: Bytes::from(header),
            writable,
        })
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frames_per_region(&self) -> u64 {
        self.frames_per_region
    }

    pub fn region_count(&self) -> usize {
        self.frame_count.div_ceil(self.frames_per_region) as usize
    }

    /// Byte offset of the first PCM frame
    pub fn data_offset(&self) -> u64 {
        self.data_offset
    }

    /// Everything in the file before the PCM payload
    pub fn header(&self) -> Bytes {
        self.header.clone()
    }

    /// Frames covered by a region; the last region may be short
    pub fn region_frames(&self, index: usize) -> Result<Range<u64>> {
        if index >= self.region_count() {
            return Err(StreamError::invalid(format!(
                "region {} out of range (recording has {})",
                index,
                self.region_count()
            )));
        }
        let start = index as u64 * self.frames_per_region;
        let end = (start + self.frames_per_region).min(self.frame_count);
        Ok(start..end)
    }

    /// Start and end time of a region in seconds
    pub fn region_span_secs(&self, index: usize) -> Result<(f64, f64)> {
        let frames = self.region_frames(index)?;
        let rate = self.sample_rate as f64;
        Ok((frames.start as f64 / rate, frames.end as f64 / rate))
    }

    /// Absolute byte offset and length of a region
    fn region_bytes(&self, index: usize) -> Result<(u64, usize)> {
        let frames = self.region_frames(index)?;
        let frame_bytes = self.layout.frame_bytes() as u64;
        let offset = self.data_offset + frames.start * frame_bytes;
        let len = (frames.end - frames.start) * frame_bytes;
        Ok((offset, len as usize))
    }

    /// Read every frame of a region as it currently sits on disk
    pub fn read_region(&self, index: usize) -> Result<SampleBuffer> {
        let (offset, len) = self.region_bytes(index)?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut data = vec![0u8; len];
        file.read_exact(&mut data)?;

        Ok(SampleBuffer::from_bytes(self.layout, data))
    }

    /// Replace a region's bytes with `buffer` in one positioned write
    pub fn write_region(&self, index: usize, buffer: &SampleBuffer) -> Result<()> {
        let (offset, len) = self.region_bytes(index)?;
        if buffer.byte_len() != len || buffer.layout() != self.layout {
            return Err(StreamError::invalid(format!(
                "buffer of {} bytes does not fit region {} ({} bytes)",
                buffer.byte_len(),
                index,
                len
            )));
        }

        if !self.writable {
            return Err(StreamError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                format!("{} is open read-only", self.path.display()),
            )));
        }

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buffer.as_bytes())?;

        Ok(())
    }

    /// Silent stand-in with the same length as a region
    pub fn silent_region(&self, index: usize) -> Result<SampleBuffer> {
        let frames = self.region_frames(index)?;
        Ok(SampleBuffer::silence(
            self.layout,
            (frames.end - frames.start) as usize,
        ))
    }
}
