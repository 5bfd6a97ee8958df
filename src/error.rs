//! Error types for stream opening, decoding, and playback.

use thiserror::Error;

/// Errors reported by the decode and playback pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure while reading the byte source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The Ogg container framing is broken beyond recovery.
    #[error("malformed Ogg stream: {0}")]
    Container(String),

    /// The stream is well-formed but not something we can play.
    #[error("unsupported stream: {0}")]
    Unsupported(String),

    /// Fatal Opus decoder failure.
    #[error("Opus decode error: {0}")]
    Decode(#[from] opus::Error),

    /// ALSA device failure.
    #[error("audio device error: {0}")]
    Device(#[from] alsa::Error),

    /// A buffer was submitted to a voice whose playback thread is gone.
    #[error("playback voice is not running")]
    VoiceClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
