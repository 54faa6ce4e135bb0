//! Speech recognition using the [`vosk`] crate.
//!
//! [`Transcriber`] holds a loaded Vosk model and converts one captured
//! [`Utterance`] into text per call. A fresh recogniser is built for every
//! utterance because the capture device's sample rate is only known at
//! record time. A failed transcription is a real error, not text: the
//! caller must branch on the result rather than feed an error message into
//! phrase matching.

use anyhow::{Context, Result};
use vosk::{Model, Recognizer};

use crate::capture::Utterance;

/// Maps one utterance to its transcript. [`Transcriber`] is the production
/// implementation; tests substitute fixed or failing transcripts.
pub trait Transcribe: Send {
    fn transcribe(&self, utterance: &Utterance) -> Result<String>;
}

/// Offline speech-to-text over a Vosk model.
pub struct Transcriber {
    model: Model,
}

impl Transcriber {
    /// Load the Vosk model from disk. If the model files cannot be found
    /// or are incompatible with the host platform Vosk will return an
    /// error here. See the crate documentation for setup instructions.
    pub fn new(model_path: &str) -> Result<Self> {
        let model = Model::new(model_path)
            .with_context(|| format!("Failed to load Vosk model from '{}'.", model_path))?;
        Ok(Self { model })
    }

    /// Recognise the utterance and return the transcript. If no speech is
    /// detected an empty string is returned; any recogniser error is
    /// propagated to the caller.
    pub fn transcribe(&self, utterance: &Utterance) -> Result<String> {
        let mut recogniser = Recognizer::new(&self.model, utterance.sample_rate as f32)
            .with_context(|| "Failed to create Vosk recogniser")?;

        // Word-level timing and alternatives are not needed for whole-window
        // phrase recognition.
        recogniser.set_words(false);
        recogniser.set_max_alternatives(0);

        if utterance.samples.is_empty() {
            return Ok(String::new());
        }

        recogniser.accept_waveform(&utterance.samples)?;
        let final_result = recogniser.final_result();
        // `single()` returns `Option<CompleteResultSingle>`; extract the
        // recognised transcript if present.
        if let Some(single) = final_result.single() {
            return Ok(single.text.to_string());
        }
        Ok(String::new())
    }
}

impl Transcribe for Transcriber {
    fn transcribe(&self, utterance: &Utterance) -> Result<String> {
        Transcriber::transcribe(self, utterance)
    }
}
