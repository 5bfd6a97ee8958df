//! Decode-and-play loop over a bounded buffer pool.
//!
//! The loop moves through three phases: filling (decode into the current
//! pool slot and submit while the voice's queue has room), draining (the
//! source is exhausted or failed, nothing more is submitted), and flushing
//! (poll until the voice reports an empty queue). There is no event-driven
//! wake-up on queue drain; a short sleep between polls is the only back-off.

use std::thread;
use std::time::Duration;

use super::pool::BlockPool;
use super::sample_source::{BlockRead, SampleSource};
use super::voice::PlaybackVoice;
use crate::config::{ErrorPolicy, PlayerConfig};
use crate::error::{Error, Result};

/// Counters from a completed playback run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayStats {
    /// Buffers handed to the voice.
    pub submissions: u64,
    /// Sample frames handed to the voice.
    pub frames: u64,
    /// Recoverable gaps skipped without consuming a slot.
    pub gaps: u64,
    /// Pool cursor when the loop left the filling phase; equals the number
    /// of submissions modulo the pool size.
    pub cursor: usize,
}

/// Decode `source` block by block into a round-robin pool and play it
/// through `voice`.
///
/// Exactly one decode+submit operation is in flight at a time; the voice's
/// queue depth is checked before every slot refill. On a fatal decode error
/// the queue is still flushed before the error is returned, so the voice has
/// played everything submitted up to that point. Voice failures abort
/// immediately.
pub fn run<S, V>(source: &mut S, voice: &mut V, config: &PlayerConfig) -> Result<PlayStats>
where
    S: SampleSource + ?Sized,
    V: PlaybackVoice + ?Sized,
{
    let channels = usize::from(source.channels());
    if channels == 0 {
        return Err(Error::Unsupported("stream reports zero channels".into()));
    }

    let mut pool = BlockPool::new(config.pool_slots, config.block_frames * channels);
    let poll = Duration::from_millis(config.poll_interval_ms);
    let mut stats = PlayStats::default();
    let mut failure = None;

    voice.start()?;

    // Filling
    loop {
        if voice.queued() >= pool.len() {
            thread::sleep(poll);
            continue;
        }
        match source.read_block(pool.current_mut()) {
            Ok(BlockRead::Frames(frames)) => {
                voice.submit(&pool.current()[..frames * channels])?;
                pool.advance();
                stats.submissions += 1;
                stats.frames += frames as u64;
            }
            Ok(BlockRead::Gap) => {
                stats.gaps += 1;
                log::warn!("bitstream gap, slot not consumed");
            }
            Ok(BlockRead::End) => {
                log::info!("end of stream after {} blocks", stats.submissions);
                break;
            }
            Err(e) => match config.error_policy {
                ErrorPolicy::Fatal => {
                    failure = Some(e);
                    break;
                }
                ErrorPolicy::EndStream => {
                    log::warn!("decode error treated as end of stream: {}", e);
                    break;
                }
            },
        }
    }
    stats.cursor = pool.cursor();

    // Flushing
    while voice.queued() > 0 {
        thread::sleep(poll);
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(stats),
    }
}
