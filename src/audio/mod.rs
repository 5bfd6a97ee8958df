//! audio - Ogg Opus decoding and buffered ALSA playback.
//!
//! The pipeline reads a byte source (file or in-memory buffer), decodes Opus
//! packets into a round-robin pool of PCM blocks, and hands each block to a
//! playback voice whose queue depth provides the back-pressure signal.

mod alsa_device;
mod byte_source;
mod ogg_opus;
pub mod play;
mod pool;
mod sample_source;
mod voice;
mod wave;

pub use alsa_device::AlsaParams;
pub use byte_source::MemorySource;
pub use ogg_opus::{OggOpusReader, OpusHead};
pub use play::PlayStats;
pub use pool::BlockPool;
pub use sample_source::{BlockRead, SampleSource};
pub use voice::{AlsaVoice, PlaybackVoice};
pub use wave::{BITS_PER_SAMPLE, OPUS_SAMPLE_RATE, WAVE_FORMAT_PCM, WaveFormat};
