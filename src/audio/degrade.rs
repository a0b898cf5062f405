//! Play-count driven sample dropout
//!
//! Each pass over a region silences a random subset of its frames. The share of
//! frames dropped grows linearly with the region's play count:
//! `d = min(play_count × decay_rate / 100, 1.0)`.

use super::buffer::SampleBuffer;
use rand::Rng;

/// Probability that any single frame is silenced on a pass
pub fn dropout_fraction(play_count: u64, decay_rate: f64) -> f64 {
    let d = play_count as f64 * decay_rate / 100.0;
    if d.is_nan() || d <= 0.0 {
        0.0
    } else {
        d.min(1.0)
    }
}

/// Return a degraded copy of `buffer`; the input is never touched.
pub fn degrade<R: Rng + ?Sized>(
    buffer: &SampleBuffer,
    play_count: u64,
    decay_rate: f64,
    rng: &mut R,
) -> SampleBuffer {
    let mut out = buffer.clone();
    degrade_in_place(&mut out, play_count, decay_rate, rng);
    out
}

/// Silence frames of an owned buffer in place.
///
/// One uniform draw per frame governs every channel of that frame, so a
/// dropout never splits a stereo image. Returns the number of frames silenced.
pub fn degrade_in_place<R: Rng + ?Sized>(
    buffer: &mut SampleBuffer,
    play_count: u64,
    decay_rate: f64,
    rng: &mut R,
) -> usize {
    let d = dropout_fraction(play_count, decay_rate);
    let frames = buffer.frame_count();

    if d <= 0.0 || frames == 0 {
        return 0;
    }

    if d >= 1.0 {
        for i in 0..frames {
            buffer.silence_frame(i);
        }
        return frames;
    }

    let mut dropped = 0;
    for i in 0..frames {
        if rng.gen::<f64>() < d {
            buffer.silence_frame(i);
            dropped += 1;
        }
    }
    dropped
}
