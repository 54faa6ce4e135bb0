//! Entry point for the Mimu voice-interaction service.
//!
//! The service runs two things side by side:
//!
//!  * the interaction loop, which records the microphone in fixed windows,
//!    verifies the speaker, transcribes the window offline via Vosk,
//!    answers a small table of Vietnamese phrases out loud and sometimes
//!    chatters on its own; and
//!  * the interactive channel, a two-route HTTP surface on which an
//!    external client can inject text to be spoken (`POST /speak`) and
//!    poll the latest recognized text (`GET /listen`).
//!
//! The program is configurable via environment variables:
//!
//!  * `VOSK_MODEL_PATH` (**required**): path to a downloaded Vosk model.
//!  * `VOICE_NAME` (optional): partial match for selecting a specific TTS voice.
//!  * `CAPTURE_SECS` (optional): length of each listening window, default 5.
//!  * `AUDIO_OUTPUT_FILE` (optional): WAV artifact path, default `output.wav`.
//!  * `HTTP_ADDR` (optional): interactive channel bind address, default
//!    `127.0.0.1:5000`.
//!  * `MIC_INDEX`/`MIC_NAME_KEYWORD` (optional): control which input
//!    device is captured (see `capture.rs` for details).

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::Mutex;

mod api;
mod auth;
mod capture;
mod chatter;
mod phrases;
mod queue;
mod service;
mod stt;
mod tts_engine;

use api::ApiState;
use auth::AlwaysAccept;
use capture::AudioCapture;
use queue::RecognizedTextQueue;
use service::InteractionLoop;
use stt::Transcriber;
use tts_engine::{SharedSpeaker, TtsEngine};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from `.env` if present.
    dotenvy::dotenv().ok();
    env_logger::init();

    // Retrieve required and optional configuration.
    let model_path = env::var("VOSK_MODEL_PATH")
        .context("VOSK_MODEL_PATH environment variable must point to a Vosk model directory")?;
    let voice_name = env::var("VOICE_NAME").ok();
    let capture_secs = env::var("CAPTURE_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(5);
    let output_file = env::var("AUDIO_OUTPUT_FILE").unwrap_or_else(|_| "output.wav".to_string());
    let http_addr: SocketAddr = env::var("HTTP_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:5000".to_string())
        .parse()
        .context("HTTP_ADDR must be a socket address such as 127.0.0.1:5000")?;

    // Initialise audio input and speech recognition.
    let capture = AudioCapture::new(PathBuf::from(output_file))?;
    let transcriber = Transcriber::new(&model_path)?;

    // Initialise TTS. If a voice is specified attempt to select it.
    let mut tts = TtsEngine::new()?;
    if let Some(name) = voice_name {
        match tts.set_voice_by_name(&name) {
            Ok(_) => log::info!("Using voice: {}", name),
            Err(e) => log::warn!(
                "Failed to set voice '{}': {e}. Falling back to default.",
                name
            ),
        }
    }
    let speaker: SharedSpeaker = Arc::new(Mutex::new(tts));

    // The recognized-text queue is owned here and handed to both the loop
    // (producer) and the HTTP handlers (consumer).
    let recognized = Arc::new(RecognizedTextQueue::new());

    log::info!("Starting Mimu's Voice Interaction Service...");

    // Handle Ctrl-C (SIGINT) to allow graceful shutdown
    let _shutdown = tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
        }
        log::info!("Service stopped.");
        std::process::exit(0);
    });

    // Serve the interactive channel alongside the loop.
    let api_state = ApiState {
        queue: recognized.clone(),
        speaker: speaker.clone(),
    };
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, http_addr).await {
            log::error!("Interactive channel failed: {e:#}");
        }
    });

    let service = InteractionLoop::new(
        Box::new(capture),
        Box::new(transcriber),
        Box::new(AlwaysAccept),
        speaker,
        recognized,
        Duration::from_secs(capture_secs),
    );
    service.run().await;

    Ok(())
}
