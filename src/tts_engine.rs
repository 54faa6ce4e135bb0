//! Text-to-speech abstraction built on top of the [`tts`] crate.
//!
//! The [`tts`] crate delegates synthesis to the underlying operating system
//! (Speech Dispatcher on Linux, SAPI on Windows, AVFoundation on macOS).
//! This module exposes a [`TtsEngine`] type that can speak arbitrary
//! strings and optionally select a voice by name, plus the [`Speak`] trait
//! through which both the interaction loop and the HTTP handlers address
//! it. The trait seam lets tests substitute a recording speaker.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tts::Tts;

/// Anything that can render text out loud.
#[async_trait]
pub trait Speak: Send {
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Speaker handle shared between the interaction loop and the HTTP surface.
/// Utterances are serialised through the mutex so two callers never talk
/// over each other.
pub type SharedSpeaker = Arc<Mutex<dyn Speak>>;

/// Wrapper around the [`tts`] crate providing convenience methods for
/// speaking text and selecting a specific voice.
pub struct TtsEngine {
    tts: Tts,
}

impl TtsEngine {
    /// Create a new TTS engine. Internally this initialises the system
    /// speech synthesis backend. If no backend is available on the host
    /// platform this will return an error.
    pub fn new() -> Result<Self> {
        let tts = Tts::default().context("failed to initialise text-to-speech engine")?;
        Ok(Self { tts })
    }

    /// Choose a voice by name. The supplied name is matched case
    /// insensitively against the available voices. If a matching voice
    /// cannot be found the previous voice remains active and an error is
    /// returned.
    pub fn set_voice_by_name(&mut self, name: &str) -> Result<()> {
        let available = self.tts.voices().context("failed to enumerate voices")?;
        let target = name.to_lowercase();
        for voice in available {
            if voice.name().to_lowercase().contains(&target) {
                self.tts
                    .set_voice(&voice)
                    .context("failed to set TTS voice")?;
                return Ok(());
            }
        }
        Err(anyhow!(format!("no voice matching '{name}' found")))
    }
}

#[async_trait]
impl Speak for TtsEngine {
    /// Speak the provided text. Existing speech will be interrupted if it
    /// is still playing. This method is asynchronous because the call to
    /// [`tts::Tts::speak`] blocks until the underlying OS has queued the
    /// utterance. We use `spawn_blocking` so as not to stall the Tokio
    /// executor while synthesis takes place.
    async fn speak(&mut self, text: &str) -> Result<()> {
        let text_owned = text.to_owned();
        let tts = self.tts.clone();
        tokio::task::spawn_blocking(move || {
            let mut tts = tts;
            // Stop any existing utterances. Ignore errors here since we
            // immediately follow with a new speak call.
            let _ = tts.stop();
            tts.speak(&text_owned, true)
                .map_err(|e| anyhow!(format!("TTS speak failed: {e:?}")))
        })
        .await
        .context("failed to join blocking TTS task")??;
        Ok(())
    }
}
