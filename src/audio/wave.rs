//! PCM format header handed to the playback voice.

/// Format tag for uncompressed PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Opus always decodes at 48 kHz.
pub const OPUS_SAMPLE_RATE: u32 = 48_000;

/// Bit depth of the decoded samples.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Fixed 18-byte PCM format descriptor.
///
/// Field order and widths follow the classic wave format header; the
/// serialized form is exactly [`WaveFormat::ENCODED_LEN`] little-endian bytes
/// with no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveFormat {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extra_size: u16,
}

impl WaveFormat {
    /// Size of the serialized header in bytes.
    pub const ENCODED_LEN: usize = 18;

    /// Build the header for a 16-bit 48 kHz PCM stream with the given
    /// channel count. Block alignment and byte rate are derived.
    pub fn pcm_48k(channels: u16) -> Self {
        let block_align = BITS_PER_SAMPLE / 8 * channels;
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            samples_per_sec: OPUS_SAMPLE_RATE,
            avg_bytes_per_sec: OPUS_SAMPLE_RATE * u32::from(block_align),
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            extra_size: 0,
        }
    }

    /// Serialize into the exact 18-byte wire layout.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[0..2].copy_from_slice(&self.format_tag.to_le_bytes());
        out[2..4].copy_from_slice(&self.channels.to_le_bytes());
        out[4..8].copy_from_slice(&self.samples_per_sec.to_le_bytes());
        out[8..12].copy_from_slice(&self.avg_bytes_per_sec.to_le_bytes());
        out[12..14].copy_from_slice(&self.block_align.to_le_bytes());
        out[14..16].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        out[16..18].copy_from_slice(&self.extra_size.to_le_bytes());
        out
    }
}
