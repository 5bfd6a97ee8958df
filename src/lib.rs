//! opusplay - Ogg Opus file playback through a bounded multi-buffer pipeline.
//!
//! Opens an Opus audio file (from disk or from an in-memory buffer), decodes
//! it to interleaved 16-bit PCM at the codec's native 48 kHz, and streams the
//! samples to an ALSA playback device through a fixed-size ring of buffers.
//! The decode loop queries the voice's queued-buffer count before every
//! submission, so at most one pool's worth of audio is ever in flight.

pub mod audio;
pub mod config;
pub mod error;
pub mod player;

pub use config::{ErrorPolicy, PlayerConfig};
pub use error::{Error, Result};
pub use player::{play_bytes, play_path};
