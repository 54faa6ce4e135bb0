//! The interaction loop: one authenticate → recognise → respond → chatter
//! cycle, forever.
//!
//! Each cycle blocks for the full capture window, so the loop's latency is
//! the window length by construction. Every fallible step is funnelled
//! through [`InteractionLoop::run_cycle`]; an error there is logged at the
//! cycle boundary and the next cycle starts — a bad cycle never takes the
//! service down. The only exit is the Ctrl-C handler installed in `main`.
//!
//! The loop holds its collaborators behind traits ([`CaptureSource`],
//! [`Transcribe`], [`VoiceAuthenticator`], [`crate::tts_engine::Speak`])
//! so the dispatch path itself can be exercised with doubles.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Local, Timelike};

use crate::auth::VoiceAuthenticator;
use crate::capture::{CaptureSource, Utterance};
use crate::chatter;
use crate::phrases;
use crate::queue::RecognizedTextQueue;
use crate::stt::Transcribe;
use crate::tts_engine::SharedSpeaker;

pub struct InteractionLoop {
    capture: Box<dyn CaptureSource>,
    transcriber: Box<dyn Transcribe>,
    authenticator: Box<dyn VoiceAuthenticator>,
    speaker: SharedSpeaker,
    queue: Arc<RecognizedTextQueue>,
    capture_window: Duration,
}

impl InteractionLoop {
    pub fn new(
        capture: Box<dyn CaptureSource>,
        transcriber: Box<dyn Transcribe>,
        authenticator: Box<dyn VoiceAuthenticator>,
        speaker: SharedSpeaker,
        queue: Arc<RecognizedTextQueue>,
        capture_window: Duration,
    ) -> Self {
        Self {
            capture,
            transcriber,
            authenticator,
            speaker,
            queue,
            capture_window,
        }
    }

    /// Run cycles until the process is interrupted. Cycle failures are
    /// logged and absorbed here.
    pub async fn run(self) {
        loop {
            if let Err(e) = self.run_cycle().await {
                log::error!("Error in service loop: {e:#}");
            }
        }
    }

    /// One full cycle. Capture blocks for the whole window; authentication
    /// gates the recognise/respond steps; the two chatter draws run
    /// regardless of the authentication outcome.
    async fn run_cycle(&self) -> Result<()> {
        let utterance = self.capture.record(self.capture_window)?;
        self.handle_utterance(&utterance).await;

        // Two independent draws; both may fire in the same cycle. The rng
        // is scoped so it is gone before any await below.
        let mut lines: Vec<&'static str> = Vec::new();
        {
            let mut rng = rand::thread_rng();
            if chatter::spontaneous_due(&mut rng) {
                lines.push(chatter::pick_line(&mut rng));
            }
            let minute = Local::now().minute();
            if chatter::heartbeat_due(minute, &mut rng) {
                lines.push(chatter::pick_line(&mut rng));
            }
        }
        for line in lines {
            log::info!("Mimu said: {line}");
            self.say(line).await;
        }

        Ok(())
    }

    /// The command path: authenticate the utterance, transcribe it, queue
    /// the transcript and speak the matched response. An unauthenticated
    /// utterance skips all of it; a failed transcription ends it early.
    async fn handle_utterance(&self, utterance: &Utterance) {
        if !self.authenticator.authenticate(utterance) {
            log::info!("Ignored non-Ba voice.");
            return;
        }

        // A transcription failure is an error, never text: it must not
        // reach phrase matching or the queue as if it were speech.
        match self.transcriber.transcribe(utterance) {
            Ok(text) => {
                log::info!("Recognized Text: {text}");
                self.queue.push(text.clone());
                let response = phrases::respond(&text);
                self.say(response).await;
            }
            Err(e) => log::warn!("Error in speech recognition: {e:#}"),
        }
    }

    /// Speak one line. Synthesis failures are logged here and never
    /// propagated; a lost response leaves the cycle otherwise intact.
    async fn say(&self, text: &str) {
        if let Err(e) = self.speaker.lock().await.speak(text).await {
            log::warn!("Error during TTS: {e:#}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AlwaysAccept;
    use crate::chatter::AUTONOMOUS_LINES;
    use crate::tts_engine::Speak;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    struct CannedCapture;

    impl CaptureSource for CannedCapture {
        fn record(&self, _duration: Duration) -> Result<Utterance> {
            Ok(Utterance {
                samples: vec![0; 160],
                sample_rate: 16_000,
            })
        }
    }

    struct FixedTranscript(&'static str);

    impl Transcribe for FixedTranscript {
        fn transcribe(&self, _utterance: &Utterance) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FailingTranscriber;

    impl Transcribe for FailingTranscriber {
        fn transcribe(&self, _utterance: &Utterance) -> Result<String> {
            Err(anyhow!("recognizer unavailable"))
        }
    }

    /// Speaker double that records every utterance it is asked to render.
    struct RecordingSpeaker {
        spoken: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl Speak for RecordingSpeaker {
        async fn speak(&mut self, text: &str) -> Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn build_loop(
        transcriber: Box<dyn Transcribe>,
    ) -> (
        InteractionLoop,
        Arc<RecognizedTextQueue>,
        Arc<StdMutex<Vec<String>>>,
    ) {
        let spoken = Arc::new(StdMutex::new(Vec::new()));
        let speaker: SharedSpeaker = Arc::new(Mutex::new(RecordingSpeaker {
            spoken: spoken.clone(),
        }));
        let queue = Arc::new(RecognizedTextQueue::new());
        let service = InteractionLoop::new(
            Box::new(CannedCapture),
            transcriber,
            Box::new(AlwaysAccept),
            speaker,
            queue.clone(),
            Duration::from_secs(5),
        );
        (service, queue, spoken)
    }

    // The chatter draws in run_cycle are genuinely random, so assertions
    // about spoken lines classify them: anything that is not a member of
    // AUTONOMOUS_LINES must be a command response.
    fn command_responses(spoken: &[String]) -> Vec<String> {
        spoken
            .iter()
            .filter(|line| !AUTONOMOUS_LINES.contains(&line.as_str()))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn recognized_text_is_queued_and_answered_exactly_once() {
        let (service, queue, spoken) =
            build_loop(Box::new(FixedTranscript("Mi nói chuyện với ba")));
        service.run_cycle().await.unwrap();

        assert_eq!(queue.try_pop().as_deref(), Some("Mi nói chuyện với ba"));
        assert_eq!(queue.try_pop(), None);

        let responses = command_responses(&spoken.lock().unwrap());
        assert_eq!(responses, ["Dạ chào ba, có chuyện gì không ạ?"]);
    }

    #[tokio::test]
    async fn failed_transcription_reaches_neither_queue_nor_phrase_matching() {
        let (service, queue, spoken) = build_loop(Box::new(FailingTranscriber));
        service.run_cycle().await.unwrap();

        assert_eq!(queue.try_pop(), None);
        // No response and no fallback: the only admissible speech this
        // cycle is autonomous chatter.
        assert!(command_responses(&spoken.lock().unwrap()).is_empty());
    }

    #[tokio::test]
    async fn empty_transcript_is_ordinary_text() {
        let (service, queue, spoken) = build_loop(Box::new(FixedTranscript("")));
        service.run_cycle().await.unwrap();

        assert_eq!(queue.try_pop().as_deref(), Some(""));
        let responses = command_responses(&spoken.lock().unwrap());
        assert_eq!(responses, [phrases::FALLBACK_RESPONSE]);
    }
}
