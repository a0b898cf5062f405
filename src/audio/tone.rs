use anyhow::{Context, Result};
use std::f64::consts::PI;
use std::path::Path;
use tracing::info;

/// Parameters for a generated test recording
#[derive(Debug, Clone)]
pub struct ToneSpec {
    /// Length in seconds
    pub duration_secs: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (every channel carries the same tone)
    pub channels: u16,
    /// Tone frequency in Hz
    pub frequency: f64,
    /// Linear fade in/out length in seconds
    pub fade_secs: f64,
}

impl Default for ToneSpec {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            sample_rate: 44100,
            channels: 1,
            frequency: 440.0, // A4
            fade_secs: 0.1,
        }
    }
}

/// Write a 16-bit PCM sine tone, used to seed an audio directory for testing
pub fn write_tone(path: impl AsRef<Path>, tone: &ToneSpec) -> Result<u64> {
    let path = path.as_ref();

    let spec = hound::WavSpec {
        channels: tone.channels,
        sample_rate: tone.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

    let rate = tone.sample_rate as f64;
    let frames = (tone.duration_secs * rate).round() as u64;
    let fade_frames = ((tone.fade_secs * rate) as u64).min(frames / 2);

    for n in 0..frames {
        let mut amplitude = (2.0 * PI * tone.frequency * n as f64 / rate).sin();

        if fade_frames > 0 {
            if n < fade_frames {
                amplitude *= n as f64 / fade_frames as f64;
            } else if n >= frames - fade_frames {
                amplitude *= (frames - n) as f64 / fade_frames as f64;
            }
        }

        let sample = (amplitude * i16::MAX as f64) as i16;
        for _ in 0..tone.channels {
            writer
                .write_sample(sample)
                .context("Failed to write sample to WAV")?;
        }
    }

    writer.finalize().context("Failed to finalize WAV file")?;

    info!(
        "Wrote {:.1}s tone to {} ({}Hz, {} channels)",
        tone.duration_secs,
        path.display(),
        tone.sample_rate,
        tone.channels
    );

    Ok(frames)
}
