//! Microphone capture using [`cpal`].
//!
//! The [`AudioCapture`] struct owns a selected input device and provides a
//! blocking API for recording one fixed-duration window of audio. Under the
//! hood it streams samples from the chosen device, down-mixes multichannel
//! input to mono `i16` and collects everything produced during the window.
//! The captured samples are returned as an [`Utterance`] and also written to
//! a single WAV artifact that is overwritten on every cycle.
//!
//! Capture runs at the selected device's default sample rate rather than
//! forcing the nominal 16 kHz — many devices refuse a fixed rate. The true
//! rate travels with the [`Utterance`], so the recogniser and the WAV
//! header always agree with the audio.
//!
//! The environment variables `MIC_INDEX` and `MIC_NAME_KEYWORD` control
//! which microphone is selected at construction time. If `MIC_INDEX` is
//! provided and can be parsed as a `usize` then the device at that index
//! in the enumeration of available input devices is chosen. Otherwise, if
//! `MIC_NAME_KEYWORD` is set the first device whose name contains the
//! provided keyword (case insensitive) is used. If neither variable is
//! set or no match is found, the default input device is used. If there
//! is no default device the constructor returns an error.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

/// One fixed-duration audio window, processed as a unit and discarded at the
/// end of its cycle. Holds mono 16-bit samples and the rate they were
/// captured at.
pub struct Utterance {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
}

impl Utterance {
    /// Write the samples as a mono 16-bit PCM WAV file, replacing any
    /// previous artifact at `path`.
    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create WAV file at '{}'", path.display()))?;
        for &sample in &self.samples {
            writer.write_sample(sample)?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(())
    }
}

/// Source of captured utterances. [`AudioCapture`] is the production
/// implementation; tests substitute canned audio.
pub trait CaptureSource: Send {
    fn record(&self, duration: Duration) -> Result<Utterance>;
}

/// Records fixed windows of microphone audio.
pub struct AudioCapture {
    device: cpal::Device,
    output_file: PathBuf,
}

impl AudioCapture {
    /// Select a microphone based on environment variables and remember the
    /// WAV artifact path. Fails if the host exposes no input device.
    pub fn new(output_file: PathBuf) -> Result<Self> {
        let host = cpal::default_host();
        let device_iter = host
            .input_devices()
            .with_context(|| "Failed to enumerate input audio devices")?;
        // Collect devices into a vector because the iterator cannot be cloned.
        let devices: Vec<cpal::Device> = device_iter.collect();

        // Try to select a device based on MIC_INDEX or MIC_NAME_KEYWORD. Both
        // variables are optional; if neither is provided we fall back to the
        // default input device. If parsing fails or no matching device is
        // found the default device will also be used.
        let mic_index = env::var("MIC_INDEX")
            .ok()
            .and_then(|s| s.parse::<usize>().ok());
        let mic_keyword = env::var("MIC_NAME_KEYWORD").ok();

        let mut selected_device: Option<cpal::Device> = None;

        if let Some(idx) = mic_index {
            if idx < devices.len() {
                selected_device = Some(devices[idx].clone());
            }
        }

        if selected_device.is_none() {
            if let Some(keyword) = mic_keyword {
                let keyword_lower = keyword.to_lowercase();
                for dev in &devices {
                    if let Ok(name) = dev.name() {
                        if name.to_lowercase().contains(&keyword_lower) {
                            selected_device = Some(dev.clone());
                            break;
                        }
                    }
                }
            }
        }

        // Fall back to default input device if none selected yet
        if selected_device.is_none() {
            selected_device = host.default_input_device();
        }

        let device = selected_device.ok_or_else(|| anyhow!("No input audio device found"))?;

        if let Ok(name) = device.name() {
            log::info!("Using microphone: {}", name);
        }

        Ok(Self {
            device,
            output_file,
        })
    }

    /// Record the microphone for the full `duration` and return the captured
    /// mono samples. This call blocks until the window elapses; there is no
    /// early stop on silence, since each cycle processes exactly one
    /// fixed-size window. The WAV artifact is rewritten before returning.
    pub fn record(&self, duration: Duration) -> Result<Utterance> {
        log::info!("Listening for {} seconds...", duration.as_secs());

        // Obtain the default input configuration. This contains the sample
        // rate, number of channels and sample format supported by the device.
        let config = self
            .device
            .default_input_config()
            .with_context(|| "Failed to get default input configuration")?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;

        // Create a channel to transfer audio samples from the CPAL callback
        // to our consumer. We use a standard synchronous channel from
        // std::sync to avoid pulling in additional async dependencies here.
        let (tx, rx) = mpsc::channel::<Vec<i16>>();

        let err_fn = |err| {
            log::error!("An error occurred on the input audio stream: {}", err);
        };

        // Build the input stream according to the detected sample format. Each
        // closure converts the raw input buffer into a vector of i16 samples
        // representing the mono audio stream and then sends it over the
        // channel. Channels are interleaved so we take only the first sample
        // from each frame to reduce to mono. If sending fails (because the
        // receiver has been dropped) the callback simply returns.
        let stream: cpal::Stream = match config.sample_format() {
            SampleFormat::I16 => {
                let tx = tx.clone();
                self.device.build_input_stream(
                    &config.into(),
                    move |data: &[i16], _| {
                        let mut mono = Vec::with_capacity(data.len() / channels);
                        for frame in data.chunks(channels) {
                            mono.push(frame[0]);
                        }
                        if tx.send(mono).is_err() {
                            // Receiver has been dropped; stop sending
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::U16 => {
                let tx = tx.clone();
                self.device.build_input_stream(
                    &config.into(),
                    move |data: &[u16], _| {
                        let mut mono = Vec::with_capacity(data.len() / channels);
                        for frame in data.chunks(channels) {
                            // Convert unsigned sample to signed range by subtracting midpoint
                            let s = frame[0] as i32 - 32768;
                            mono.push(s as i16);
                        }
                        if tx.send(mono).is_err() {
                            // Receiver has been dropped
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            SampleFormat::F32 => {
                let tx = tx.clone();
                self.device.build_input_stream(
                    &config.into(),
                    move |data: &[f32], _| {
                        let mut mono = Vec::with_capacity(data.len() / channels);
                        for frame in data.chunks(channels) {
                            // Convert from [-1.0, 1.0] float to i16 range
                            let sample = frame[0];
                            let s = (sample * 32768.0).clamp(-32768.0, 32767.0) as i16;
                            mono.push(s);
                        }
                        if tx.send(mono).is_err() {
                            // Receiver has been dropped
                        }
                    },
                    err_fn,
                    None,
                )?
            }
            // cpal marks SampleFormat as non-exhaustive so we must include a
            // wildcard arm. If a new format becomes available you can extend
            // the match accordingly.
            _ => {
                return Err(anyhow!(format!(
                    "Unsupported sample format: {:?}",
                    config.sample_format()
                )));
            }
        };

        // Start streaming from the microphone
        stream
            .play()
            .with_context(|| "Failed to start audio input stream")?;

        let start_time = Instant::now();
        let mut samples: Vec<i16> = Vec::new();
        // Pull chunks off the channel until the window expires. A short
        // recv_timeout keeps us from overshooting the window when the device
        // stops producing data.
        while start_time.elapsed() < duration {
            let timeout = duration
                .checked_sub(start_time.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));
            match rx.recv_timeout(timeout) {
                Ok(chunk) => samples.extend_from_slice(&chunk),
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        // Stop and drop the stream. Dropping the stream closes the input.
        drop(stream);
        drop(tx);

        let utterance = Utterance {
            samples,
            sample_rate,
        };

        utterance
            .write_wav(&self.output_file)
            .with_context(|| "Failed to save capture artifact")?;
        log::info!("Audio saved to {}", self.output_file.display());

        Ok(utterance)
    }
}

impl CaptureSource for AudioCapture {
    fn record(&self, duration: Duration) -> Result<Utterance> {
        AudioCapture::record(self, duration)
    }
}
