//! Playback pipeline configuration.

/// Playback configuration.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// ALSA playback device name (e.g. "default", "plughw:0,0")
    pub playback_device: String,
    /// Number of slots in the playback buffer pool
    pub pool_slots: usize,
    /// Sample frames per pool slot. Must hold the largest Opus packet
    /// (5760 frames at 48 kHz).
    pub block_frames: usize,
    /// Desired ALSA period size in frames (0 = let ALSA decide)
    pub period_size: usize,
    /// Sleep between queue-depth polls, in milliseconds
    pub poll_interval_ms: u64,
    /// How a fatal decoder error mid-stream is handled
    pub error_policy: ErrorPolicy,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            playback_device: "default".to_string(),
            pool_slots: 5,
            block_frames: 8192,
            period_size: 0,
            poll_interval_ms: 1,
            error_policy: ErrorPolicy::Fatal,
        }
    }
}

/// Policy for decoder errors encountered after the stream was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop submitting, flush what is queued, surface the error.
    Fatal,
    /// Log the error and end playback as if the stream had finished.
    EndStream,
}
