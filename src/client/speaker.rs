//! Reply playback through the default output device

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::sink::AudioSink;
use crate::{Error, Result};

/// Sample rate for playback (matches the TTS MP3 output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// How often the playback thread checks for stop or end of clip
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Plays MP3 clips on the default output device
///
/// Each clip runs on its own thread that owns the output stream. `stop`
/// silences the stream at once and waits for the thread to drop it.
pub struct SpeakerSink {
    config: StreamConfig,
    current: Option<Playback>,
}

struct Playback {
    stop: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

impl SpeakerSink {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device or usable config is available
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supports = |channels: u16| {
            device.supported_output_configs().ok()?.find(|c| {
                c.channels() == channels
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
        };

        let config = supports(1)
            .or_else(|| supports(2))
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "speaker sink initialized"
        );

        Ok(Self {
            config,
            current: None,
        })
    }
}

impl AudioSink for SpeakerSink {
    fn play(&mut self, mp3: Vec<u8>) -> Result<()> {
        self.stop();

        let samples = decode_mp3(&mp3)?;
        if samples.is_empty() {
            return Err(Error::Audio("clip has no audio frames".to_string()));
        }

        let stop = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let config = self.config.clone();

        let thread = {
            let stop = Arc::clone(&stop);
            let finished = Arc::clone(&finished);
            std::thread::spawn(move || {
                if let Err(e) = run_stream(&config, samples, &stop) {
                    tracing::error!(error = %e, "audio playback error");
                }
                finished.store(true, Ordering::SeqCst);
            })
        };

        self.current = Some(Playback {
            stop,
            finished,
            thread,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(playback) = self.current.take() {
            playback.stop.store(true, Ordering::SeqCst);
            if playback.thread.join().is_err() {
                tracing::warn!("playback thread panicked");
            }
        }
    }

    fn is_playing(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|p| !p.finished.load(Ordering::SeqCst))
    }
}

impl Drop for SpeakerSink {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Play samples until they run out or `stop` is raised
fn run_stream(config: &StreamConfig, samples: Vec<f32>, stop: &Arc<AtomicBool>) -> Result<()> {
    let device = cpal::default_host()
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device".to_string()))?;

    let channels = usize::from(config.channels);
    let drained = Arc::new(AtomicBool::new(false));

    let stream = {
        let stop = Arc::clone(stop);
        let drained = Arc::clone(&drained);
        let mut position = 0usize;
        device
            .build_output_stream(
                config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let silenced = stop.load(Ordering::Relaxed);
                    for frame in data.chunks_mut(channels) {
                        let sample = if silenced {
                            0.0
                        } else {
                            samples.get(position).copied().unwrap_or(0.0)
                        };
                        frame.fill(sample);
                        position += 1;
                    }
                    if position >= samples.len() {
                        drained.store(true, Ordering::Relaxed);
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio stream error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?
    };

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    while !stop.load(Ordering::SeqCst) && !drained.load(Ordering::Relaxed) {
        std::thread::sleep(POLL_INTERVAL);
    }

    drop(stream);
    Ok(())
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) if frame.channels == 2 => {
                samples.extend(frame.data.chunks(2).map(|chunk| {
                    let left = f32::from(chunk[0]) / 32768.0;
                    let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                    f32::midpoint(left, right)
                }));
            }
            Ok(frame) => {
                samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_decodes_to_nothing() {
        assert!(decode_mp3(&[]).unwrap().is_empty());
    }

    #[test]
    fn non_mp3_bytes_yield_no_samples() {
        match decode_mp3(b"definitely not audio") {
            Ok(samples) => assert!(samples.is_empty()),
            Err(e) => assert!(matches!(e, Error::Audio(_))),
        }
    }
}
