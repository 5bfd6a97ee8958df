//! Pull-based trait seam between the decoder and the playback loop.

use crate::error::Result;

/// Outcome of a single block read from a [`SampleSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRead {
    /// Sample frames decoded into the destination (always non-zero).
    Frames(usize),
    /// Recoverable bitstream discontinuity. No samples were produced and the
    /// destination must not be submitted.
    Gap,
    /// End of stream.
    End,
}

/// A source of interleaved 16-bit PCM blocks.
///
/// Implementations decode at most one compressed block per call and never
/// write more frames than fit the destination.
pub trait SampleSource {
    /// Channel count of the decoded stream.
    fn channels(&self) -> u16;

    /// Decode the next block into `pcm` (interleaved, frames x channels).
    fn read_block(&mut self, pcm: &mut [i16]) -> Result<BlockRead>;
}
