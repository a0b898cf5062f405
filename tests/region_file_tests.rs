// Integration tests for segment-addressed WAV access
//
// These tests verify container parsing, region arithmetic (including a short
// final region) and byte-exact positioned reads and writes.

mod common;

use anyhow::Result;
use common::{sample_at, write_wav, REGION_SECS, SAMPLE_RATE};
use ephemeral_audio::audio::{write_tone, RegionFile, SampleBuffer, ToneSpec};
use ephemeral_audio::error::StreamError;
use std::path::Path;
use tempfile::TempDir;

/// Mono 16-bit WAV with a LIST chunk between fmt and data
fn write_wav_with_list_chunk(path: &Path, frames: u32) -> Result<()> {
    let mut bytes = Vec::new();
    let data_len = frames * 2;
    let riff_len = 4 + (8 + 16) + (8 + 4) + (8 + data_len);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&riff_len.to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    bytes.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());

    bytes.extend_from_slice(b"LIST");
    bytes.extend_from_slice(&4u32.to_le_bytes());
    bytes.extend_from_slice(b"INFO");

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for n in 0..frames {
        bytes.extend_from_slice(&sample_at(n as u64, 0).to_le_bytes());
    }

    std::fs::write(path, bytes)?;
    Ok(())
}

#[test]
fn test_region_file_metadata() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("two-seconds.wav");
    write_wav(&path, 2.0, 1)?;

    let file = RegionFile::open(&path, REGION_SECS)?;

    assert_eq!(file.sample_rate, SAMPLE_RATE);
    assert_eq!(file.channels, 1);
    assert_eq!(file.bits_per_sample, 16);
    assert_eq!(file.frame_count(), 16000);
    assert!((file.duration_seconds - 2.0).abs() < 1e-9);
    assert_eq!(file.frames_per_region(), 4000);
    assert_eq!(file.region_count(), 4, "2.0s at 0.5s regions should give 4 regions");

    // Standard hound header is 44 bytes and is captured verbatim
    assert_eq!(file.data_offset(), 44);
    let header = file.header();
    assert_eq!(header.len(), 44);
    assert_eq!(&header[..4], b"RIFF");

    Ok(())
}

#[test]
fn test_region_file_short_last_region() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("short.wav");
    write_wav(&path, 1.2, 2)?;

    let file = RegionFile::open(&path, REGION_SECS)?;
    assert_eq!(file.region_count(), 3);

    assert_eq!(file.region_frames(0)?, 0..4000);
    assert_eq!(file.region_frames(2)?, 8000..9600);

    let last = file.read_region(2)?;
    assert_eq!(last.frame_count(), 1600, "Last region should use the true remaining length");
    assert_eq!(last.channels(), 2);
    assert_eq!(last.byte_len(), 1600 * 2 * 2);
    assert_eq!(last.sample(0, 0), sample_at(8000, 0) as i32);
    assert_eq!(last.sample(0, 1), sample_at(8000, 1) as i32);

    let (start, end) = file.region_span_secs(2)?;
    assert!((start - 1.0).abs() < 1e-9);
    assert!((end - 1.2).abs() < 1e-9);

    assert!(file.read_region(3).is_err(), "Region past the end should be rejected");

    Ok(())
}

#[test]
fn test_region_file_write_then_read_is_byte_identical() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("rw.wav");
    write_wav(&path, 2.0, 1)?;
    let file = RegionFile::open(&path, REGION_SECS)?;

    let mut buffer = file.read_region(1)?;
    for i in (0..buffer.frame_count()).step_by(3) {
        buffer.silence_frame(i);
    }
    file.write_region(1, &buffer)?;

    let reread = file.read_region(1)?;
    assert_eq!(reread.as_bytes(), buffer.as_bytes());

    // Neighbouring regions are untouched
    let before = file.read_region(0)?;
    let after = file.read_region(2)?;
    assert_eq!(before.sample(3999, 0), sample_at(3999, 0) as i32);
    assert_eq!(after.sample(0, 0), sample_at(8000, 0) as i32);

    // File is still a valid WAV of the same length
    let reopened = RegionFile::open(&path, REGION_SECS)?;
    assert_eq!(reopened.frame_count(), 16000);

    Ok(())
}

#[test]
fn test_region_file_rejects_wrong_length_write() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("len.wav");
    write_wav(&path, 1.2, 1)?;
    let file = RegionFile::open(&path, REGION_SECS)?;

    let full = file.read_region(0)?;
    let result = file.write_region(2, &full);
    assert!(matches!(result, Err(StreamError::InvalidArgument(_))));

    // Nothing was written
    let last = file.read_region(2)?;
    assert_eq!(last.sample(0, 0), sample_at(8000, 0) as i32);

    Ok(())
}

#[test]
fn test_region_file_finds_data_after_extra_chunks() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("list.wav");
    write_wav_with_list_chunk(&path, 6000)?;

    let file = RegionFile::open(&path, REGION_SECS)?;
    assert_eq!(file.data_offset(), 56);
    assert_eq!(file.header().len(), 56);
    assert_eq!(file.region_count(), 2);

    let region = file.read_region(1)?;
    assert_eq!(region.frame_count(), 2000);
    assert_eq!(region.sample(0, 0), sample_at(4000, 0) as i32);

    Ok(())
}

#[test]
fn test_region_file_rejects_non_wav() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("notes.wav");
    std::fs::write(&path, b"this is not audio at all, just some text")?;

    let result = RegionFile::open(&path, REGION_SECS);
    assert!(matches!(result, Err(StreamError::Format(_))), "got {:?}", result);

    Ok(())
}

#[test]
fn test_region_file_rejects_compressed_container() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("adpcm.wav");

    // Valid PCM header with the format tag patched to IMA ADPCM (0x11)
    write_wav(&path, 0.5, 1)?;
    let mut bytes = std::fs::read(&path)?;
    bytes[20..22].copy_from_slice(&0x11u16.to_le_bytes());
    std::fs::write(&path, bytes)?;

    let result = RegionFile::open(&path, REGION_SECS);
    assert!(matches!(result, Err(StreamError::Format(_))), "got {:?}", result);

    Ok(())
}

#[test]
fn test_region_file_nonexistent() {
    let result = RegionFile::open("/nonexistent/path/to/audio.wav", REGION_SECS);
    assert!(matches!(result, Err(StreamError::Io(_))));
}

#[test]
fn test_region_file_silent_region_matches_length() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("silence.wav");
    write_wav(&path, 1.2, 2)?;
    let file = RegionFile::open(&path, REGION_SECS)?;

    let silent: SampleBuffer = file.silent_region(2)?;
    assert_eq!(silent.byte_len(), file.read_region(2)?.byte_len());
    assert!((0..silent.frame_count()).all(|i| silent.is_frame_silent(i)));

    Ok(())
}

#[test]
fn test_region_file_unsigned_8bit_silence() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("eight.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec)?;
    for n in 0..4000 {
        writer.write_sample(((n % 100) + 1) as i8)?;
    }
    writer.finalize()?;

    let file = RegionFile::open(&path, REGION_SECS)?;
    assert!(file.layout().unsigned);
    assert_eq!(file.layout().silence_byte(), 0x80);

    let region = file.read_region(0)?;
    assert_eq!(region.sample(0, 0), 1);
    assert!(!region.is_frame_silent(0));

    Ok(())
}

#[test]
fn test_generated_tone_opens_as_recording() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("tone.wav");
    let tone = ToneSpec {
        duration_secs: 1.0,
        sample_rate: 8000,
        channels: 2,
        ..ToneSpec::default()
    };

    assert_eq!(write_tone(&path, &tone)?, 8000);

    let file = RegionFile::open(&path, 0.5)?;
    assert_eq!(file.channels, 2);
    assert_eq!(file.frame_count(), 8000);
    assert_eq!(file.region_count(), 2);

    // Fade-in starts from silence and both channels carry the same tone
    let first = file.read_region(0)?;
    assert!(first.is_frame_silent(0));
    assert_eq!(first.sample(401, 0), first.sample(401, 1));
    assert_ne!(first.sample(401, 0), 0);

    Ok(())
}

#[test]
fn test_read_only_handle_refuses_writes() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("song.wav");
    write_wav(&path, 1.0, 1)?;
    let before = std::fs::read(&path)?;

    let file = RegionFile::open_read_only(&path, REGION_SECS)?;
    assert!(!file.is_writable());

    let region = file.read_region(0)?;
    let silent = file.silent_region(0)?;
    match file.write_region(0, &silent) {
        Err(StreamError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::PermissionDenied),
        other => panic!("expected a permission error, got {:?}", other),
    }

    assert_eq!(std::fs::read(&path)?, before);
    assert_eq!(file.read_region(0)?, region);
    assert!(RegionFile::open(&path, REGION_SECS)?.is_writable());

    Ok(())
}
