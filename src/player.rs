//! High-level playback session: open a stream, open a voice, run the loop,
//! tear everything down in order.

use std::io::{Read, Seek};
use std::path::Path;

use crate::audio::play::{self, PlayStats};
use crate::audio::{AlsaVoice, OggOpusReader, PlaybackVoice, WaveFormat};
use crate::config::PlayerConfig;
use crate::error::Result;

/// Play an Opus file straight from the filesystem.
pub fn play_path<P: AsRef<Path>>(path: P, config: &PlayerConfig) -> Result<PlayStats> {
    let reader = OggOpusReader::open_path(path)?;
    play_reader(reader, config)
}

/// Play an Opus file from a complete in-memory image.
pub fn play_bytes(data: Vec<u8>, config: &PlayerConfig) -> Result<PlayStats> {
    let reader = OggOpusReader::from_bytes(data)?;
    play_reader(reader, config)
}

fn play_reader<R: Read + Seek>(
    mut reader: OggOpusReader<R>,
    config: &PlayerConfig,
) -> Result<PlayStats> {
    let head = *reader.head();
    let format = WaveFormat::pcm_48k(u16::from(head.channels));

    log::info!(
        "stream: channels={}, pre_skip={}, raw_total={} bytes, pcm_total={} frames ({} bytes)",
        head.channels,
        head.pre_skip,
        reader.raw_total(),
        reader.pcm_total(),
        reader.pcm_total() * u64::from(format.block_align),
    );
    log::info!(
        "format: tag={}, rate={} Hz, bits={}, block_align={}, byte_rate={}",
        format.format_tag,
        format.samples_per_sec,
        format.bits_per_sample,
        format.block_align,
        format.avg_bytes_per_sec,
    );

    let period_size = if config.period_size > 0 {
        Some(config.period_size)
    } else {
        None
    };
    let mut voice = AlsaVoice::new(&config.playback_device, &format, period_size);

    let result = play::run(&mut reader, &mut voice, config);

    // Teardown order holds on every path: stop, flush, then drop the voice
    // before the reader.
    if let Err(e) = voice.stop() {
        log::warn!("voice stop failed: {}", e);
    }
    if let Err(e) = voice.flush() {
        log::warn!("voice flush failed: {}", e);
    }

    result
}
