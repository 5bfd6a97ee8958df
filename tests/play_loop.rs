use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use opusplay::audio::play;
use opusplay::audio::{BlockRead, PlaybackVoice, SampleSource};
use opusplay::{Error, ErrorPolicy, PlayerConfig};

#[derive(Clone, Copy)]
enum Step {
    Frames(usize),
    Gap,
    End,
    Fail,
}

/// Source that replays a fixed script and stamps each block with the
/// ordinal of the decode call that produced it.
struct ScriptedSource {
    channels: u16,
    script: VecDeque<Step>,
    calls: usize,
}

impl ScriptedSource {
    fn new(channels: u16, steps: &[Step]) -> Self {
        Self {
            channels,
            script: steps.iter().copied().collect(),
            calls: 0,
        }
    }
}

impl SampleSource for ScriptedSource {
    fn channels(&self) -> u16 {
        self.channels
    }

    fn read_block(&mut self, pcm: &mut [i16]) -> opusplay::Result<BlockRead> {
        self.calls += 1;
        match self.script.pop_front().unwrap_or(Step::End) {
            Step::Frames(frames) => {
                pcm[0] = self.calls as i16;
                Ok(BlockRead::Frames(frames))
            }
            Step::Gap => Ok(BlockRead::Gap),
            Step::End => Ok(BlockRead::End),
            Step::Fail => Err(Error::Container("synthetic decode failure".into())),
        }
    }
}

/// Voice that records submissions and drains one queued buffer every
/// `drain_interval` queue-depth polls.
struct FakeVoice {
    pending: Cell<usize>,
    polls: Cell<usize>,
    drain_interval: usize,
    submissions: RefCell<Vec<Vec<i16>>>,
    max_pending_after_submit: Cell<usize>,
}

impl FakeVoice {
    fn new(drain_interval: usize) -> Self {
        Self {
            pending: Cell::new(0),
            polls: Cell::new(0),
            drain_interval,
            submissions: RefCell::new(Vec::new()),
            max_pending_after_submit: Cell::new(0),
        }
    }
}

impl PlaybackVoice for FakeVoice {
    fn start(&mut self) -> opusplay::Result<()> {
        Ok(())
    }

    fn submit(&mut self, samples: &[i16]) -> opusplay::Result<()> {
        self.pending.set(self.pending.get() + 1);
        self.max_pending_after_submit
            .set(self.max_pending_after_submit.get().max(self.pending.get()));
        self.submissions.borrow_mut().push(samples.to_vec());
        Ok(())
    }

    fn queued(&self) -> usize {
        let depth = self.pending.get();
        self.polls.set(self.polls.get() + 1);
        if depth > 0 && self.polls.get() % self.drain_interval == 0 {
            self.pending.set(depth - 1);
        }
        depth
    }

    fn stop(&mut self) -> opusplay::Result<()> {
        Ok(())
    }

    fn flush(&mut self) -> opusplay::Result<()> {
        self.pending.set(0);
        Ok(())
    }
}

fn config(pool_slots: usize, policy: ErrorPolicy) -> PlayerConfig {
    PlayerConfig {
        pool_slots,
        block_frames: 8192,
        poll_interval_ms: 0,
        error_policy: policy,
        ..PlayerConfig::default()
    }
}

#[test]
fn test_loop_terminates_after_decreasing_blocks() {
    let mut source =
        ScriptedSource::new(1, &[Step::Frames(8192), Step::Frames(4096), Step::Frames(2048), Step::End]);
    let mut voice = FakeVoice::new(1);

    let stats = play::run(&mut source, &mut voice, &config(5, ErrorPolicy::Fatal)).unwrap();

    assert_eq!(stats.submissions, 3);
    assert_eq!(stats.frames, 14_336);
    assert_eq!(stats.cursor, 3);
    assert_eq!(voice.submissions.borrow().len(), 3);
    // Flushing ran to completion.
    assert_eq!(voice.pending.get(), 0);
}

#[test]
fn test_five_slot_pool_plays_the_reference_sequence() {
    // Three blocks of 8192, 8192, and 4096 stereo frames, then end of
    // stream: three submissions from slots 0, 1, 2 and 20480 frames queued
    // when flushing starts.
    let mut source = ScriptedSource::new(
        2,
        &[Step::Frames(8192), Step::Frames(8192), Step::Frames(4096), Step::End],
    );
    let mut voice = FakeVoice::new(1);

    let stats = play::run(&mut source, &mut voice, &config(5, ErrorPolicy::Fatal)).unwrap();

    assert_eq!(stats.submissions, 3);
    assert_eq!(stats.frames, 20_480);
    assert_eq!(stats.cursor, 3);

    let submissions = voice.submissions.borrow();
    let sample_counts: Vec<usize> = submissions.iter().map(Vec::len).collect();
    assert_eq!(sample_counts, vec![16_384, 16_384, 8_192]);
    // Blocks arrive in decode order.
    let markers: Vec<i16> = submissions.iter().map(|s| s[0]).collect();
    assert_eq!(markers, vec![1, 2, 3]);
}

#[test]
fn test_cursor_wraps_modulo_pool_size() {
    let steps: Vec<Step> = (0..7).map(|_| Step::Frames(1024)).chain([Step::End]).collect();
    let mut source = ScriptedSource::new(1, &steps);
    let mut voice = FakeVoice::new(1);

    let stats = play::run(&mut source, &mut voice, &config(5, ErrorPolicy::Fatal)).unwrap();

    assert_eq!(stats.submissions, 7);
    assert_eq!(stats.cursor, 7 % 5);
}

#[test]
fn test_gap_consumes_no_slot() {
    let mut source =
        ScriptedSource::new(1, &[Step::Gap, Step::Gap, Step::Frames(100), Step::End]);
    let mut voice = FakeVoice::new(1);

    let stats = play::run(&mut source, &mut voice, &config(5, ErrorPolicy::Fatal)).unwrap();

    assert_eq!(stats.gaps, 2);
    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.cursor, 1);
    assert_eq!(source.calls, 4);
    // Gaps consumed no slot: submissions = decode calls - gaps - final End.
    assert_eq!(stats.submissions as usize, source.calls - 2 - 1);
    // The one submitted block came from the third decode call, written into
    // the same slot the gap iterations left untouched.
    assert_eq!(voice.submissions.borrow()[0][0], 3);
}

#[test]
fn test_queue_depth_is_checked_before_every_submission() {
    let steps: Vec<Step> = (0..20).map(|_| Step::Frames(1024)).chain([Step::End]).collect();
    let mut source = ScriptedSource::new(1, &steps);
    // Drain slowly: one buffer per four queue-depth polls.
    let mut voice = FakeVoice::new(4);

    let stats = play::run(&mut source, &mut voice, &config(3, ErrorPolicy::Fatal)).unwrap();

    assert_eq!(stats.submissions, 20);
    // The queue never grows beyond the pool size.
    assert!(voice.max_pending_after_submit.get() <= 3);
    assert_eq!(voice.pending.get(), 0);
}

#[test]
fn test_fatal_policy_surfaces_the_error_after_flushing() {
    let mut source = ScriptedSource::new(1, &[Step::Frames(100), Step::Fail]);
    let mut voice = FakeVoice::new(1);

    let result = play::run(&mut source, &mut voice, &config(5, ErrorPolicy::Fatal));

    assert!(matches!(result, Err(Error::Container(_))));
    // The block submitted before the failure was still flushed out.
    assert_eq!(voice.submissions.borrow().len(), 1);
    assert_eq!(voice.pending.get(), 0);
}

#[test]
fn test_end_stream_policy_turns_the_error_into_eof() {
    let mut source = ScriptedSource::new(1, &[Step::Frames(100), Step::Fail]);
    let mut voice = FakeVoice::new(1);

    let stats =
        play::run(&mut source, &mut voice, &config(5, ErrorPolicy::EndStream)).unwrap();

    assert_eq!(stats.submissions, 1);
    assert_eq!(stats.frames, 100);
    assert_eq!(voice.pending.get(), 0);
}
