//! Playback voice: the rendering-engine seam and its ALSA implementation.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use alsa::pcm::{IO, PCM};

use super::alsa_device::{self, AlsaParams};
use super::wave::WaveFormat;
use crate::error::{Error, Result};

/// A voice accepts PCM buffers and plays them in submission order, exposing
/// how many submitted buffers have not finished playing yet.
///
/// `queued` is the back-pressure signal: callers must observe it below their
/// pool size before reusing a pool slot.
pub trait PlaybackVoice {
    /// Begin playback. Must be called before the first `submit`.
    fn start(&mut self) -> Result<()>;

    /// Hand one buffer of interleaved samples to the voice.
    fn submit(&mut self, samples: &[i16]) -> Result<()>;

    /// Number of submitted buffers not yet fully written to the device.
    fn queued(&self) -> usize;

    /// Stop playback. Buffers still queued are not played.
    fn stop(&mut self) -> Result<()>;

    /// Discard anything still queued after a stop.
    fn flush(&mut self) -> Result<()>;
}

/// ALSA-backed voice. A dedicated `audio-play` thread drains the submission
/// queue and writes interleaved frames to the device, preparing the PCM
/// again after an XRUN before retrying the write.
pub struct AlsaVoice {
    device: String,
    format: WaveFormat,
    period_size: Option<usize>,
    queued: Arc<AtomicUsize>,
    running: Arc<AtomicBool>,
    tx: Option<mpsc::Sender<Vec<i16>>>,
    handle: Option<JoinHandle<()>>,
    params: Option<AlsaParams>,
}

impl AlsaVoice {
    pub fn new(device: &str, format: &WaveFormat, period_size: Option<usize>) -> Self {
        Self {
            device: device.to_string(),
            format: *format,
            period_size,
            queued: Arc::new(AtomicUsize::new(0)),
            running: Arc::new(AtomicBool::new(false)),
            tx: None,
            handle: None,
            params: None,
        }
    }

    /// Hardware parameters negotiated when the voice started.
    pub fn params(&self) -> Option<&AlsaParams> {
        self.params.as_ref()
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl PlaybackVoice for AlsaVoice {
    fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::channel::<Vec<i16>>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<AlsaParams>>();
        self.running.store(true, Ordering::SeqCst);

        let device = self.device.clone();
        let rate = self.format.samples_per_sec;
        let channels = u32::from(self.format.channels);
        let period_size = self.period_size;
        let running = self.running.clone();
        let queued = self.queued.clone();

        let handle = thread::Builder::new().name("audio-play".into()).spawn(move || {
            play_thread(&device, rate, channels, period_size, rx, ready_tx, &running, &queued);
        })?;
        self.handle = Some(handle);

        // The device is opened on the playback thread; wait for the outcome
        // so open failures surface here instead of on the first submit.
        match ready_rx.recv() {
            Ok(Ok(params)) => {
                self.params = Some(params);
                self.tx = Some(tx);
                Ok(())
            }
            Ok(Err(e)) => {
                self.join();
                Err(e)
            }
            Err(_) => {
                self.join();
                Err(Error::VoiceClosed)
            }
        }
    }

    fn submit(&mut self, samples: &[i16]) -> Result<()> {
        let tx = self.tx.as_ref().ok_or(Error::VoiceClosed)?;
        self.queued.fetch_add(1, Ordering::SeqCst);
        if tx.send(samples.to_vec()).is_err() {
            let _ = self
                .queued
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    Some(n.saturating_sub(1))
                });
            return Err(Error::VoiceClosed);
        }
        Ok(())
    }

    fn queued(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        self.tx.take();
        self.join();
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        // Only meaningful once the playback thread is gone; the counter then
        // reflects buffers that will never be played.
        if self.handle.is_none() {
            self.queued.store(0, Ordering::SeqCst);
        }
        Ok(())
    }
}

impl Drop for AlsaVoice {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
fn play_thread(
    device: &str,
    rate: u32,
    channels: u32,
    period_size: Option<usize>,
    rx: mpsc::Receiver<Vec<i16>>,
    ready_tx: mpsc::Sender<Result<AlsaParams>>,
    running: &AtomicBool,
    queued: &AtomicUsize,
) {
    let (pcm, params) = match alsa_device::open_playback(device, rate, channels, period_size) {
        Ok(v) => v,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let io = match pcm.io_i16() {
        Ok(io) => io,
        Err(e) => {
            let _ = ready_tx.send(Err(Error::Device(e)));
            return;
        }
    };

    let frame_channels = params.channels as usize;
    let _ = ready_tx.send(Ok(params));

    log::info!("playback voice started");

    while running.load(Ordering::Relaxed) {
        let samples = match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(samples) => samples,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };
        write_interleaved(&pcm, &io, &samples, frame_channels);
        let _ = queued.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            Some(n.saturating_sub(1))
        });
    }

    // Let the hardware play out whatever it already holds.
    let _ = pcm.drain();
    log::info!("playback voice stopped");
}

/// Write one buffer to ALSA, retrying short writes and recovering from
/// XRUNs. Gives up on a buffer after repeated failed recoveries so a dead
/// device cannot wedge the thread.
fn write_interleaved(pcm: &PCM, io: &IO<i16>, samples: &[i16], channels: usize) {
    let total_frames = samples.len() / channels;
    let mut frames_written = 0;
    let mut retry_count = 0u32;

    while frames_written < total_frames {
        let offset = frames_written * channels;
        match io.writei(&samples[offset..]) {
            Ok(n) => {
                frames_written += n;
                retry_count = 0;
            }
            Err(e) => {
                log::warn!("ALSA XRUN or error: {}, recovering...", e);
                retry_count += 1;

                if let Err(e2) = pcm.prepare() {
                    log::error!("failed to recover PCM playback: {}", e2);
                    break;
                }

                if retry_count >= 3 {
                    log::error!(
                        "max recovery retries reached, dropping {} unwritten frames",
                        total_frames - frames_written
                    );
                    break;
                }
            }
        }
    }
}
