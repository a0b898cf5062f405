use bytes::Bytes;

/// Layout of one sample inside a linear-PCM frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLayout {
    /// Number of interleaved channels per frame
    pub channels: u16,
    /// Bytes per single-channel sample (1, 2, 3 or 4)
    pub bytes_per_sample: u16,
    /// Unsigned 8-bit PCM (silence is 0x80 rather than 0x00)
    pub unsigned: bool,
}

impl SampleLayout {
    pub fn frame_bytes(&self) -> usize {
        self.channels as usize * self.bytes_per_sample as usize
    }

    /// Byte value that encodes silence for this format
    pub fn silence_byte(&self) -> u8 {
        if self.unsigned {
            0x80
        } else {
            0x00
        }
    }
}

/// Interleaved PCM frames of one region, shaped as (frames × channels).
///
/// The bytes are kept exactly as they sit on disk so a buffer read from a
/// region can be written back without any re-encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    layout: SampleLayout,
    data: Vec<u8>,
}

impl SampleBuffer {
    /// Wrap raw region bytes. Trailing bytes that do not form a whole frame are dropped.
    pub fn from_bytes(layout: SampleLayout, mut data: Vec<u8>) -> Self {
        let frame_bytes = layout.frame_bytes().max(1);
        data.truncate(data.len() - data.len() % frame_bytes);
        Self { layout, data }
    }

    /// A buffer of `frames` silent frames
    pub fn silence(layout: SampleLayout, frames: usize) -> Self {
        Self {
            layout,
            data: vec![layout.silence_byte(); frames * layout.frame_bytes()],
        }
    }

    pub fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub fn channels(&self) -> u16 {
        self.layout.channels
    }

    pub fn frame_count(&self) -> usize {
        match self.layout.frame_bytes() {
            0 => 0,
            n => self.data.len() / n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    pub fn frame(&self, index: usize) -> &[u8] {
        let n = self.layout.frame_bytes();
        &self.data[index * n..(index + 1) * n]
    }

    /// Set every channel of one frame to silence
    pub fn silence_frame(&mut self, index: usize) {
        let n = self.layout.frame_bytes();
        let silence = self.layout.silence_byte();
        self.data[index * n..(index + 1) * n].fill(silence);
    }

    pub fn is_frame_silent(&self, index: usize) -> bool {
        let silence = self.layout.silence_byte();
        self.frame(index).iter().all(|&b| b == silence)
    }

    /// Decode one sample as a signed little-endian integer.
    ///
    /// Float samples are returned as their raw bit pattern.
    pub fn sample(&self, frame: usize, channel: u16) -> i32 {
        let width = self.layout.bytes_per_sample as usize;
        let start = frame * self.layout.frame_bytes() + channel as usize * width;
        let raw = &self.data[start..start + width];
        match width {
            1 if self.layout.unsigned => raw[0] as i32 - 128,
            1 => raw[0] as i8 as i32,
            2 => i16::from_le_bytes([raw[0], raw[1]]) as i32,
            3 => {
                let v = i32::from_le_bytes([0, raw[0], raw[1], raw[2]]);
                v >> 8
            }
            _ => i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data)
    }
}
