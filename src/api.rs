//! The interactive channel: a two-route HTTP surface for injecting speech
//! and polling recognized text.
//!
//!  * `POST /speak` with `{"text": "..."}` forwards the text verbatim to
//!    the speaker. Empty or absent text is a client error; nothing is
//!    spoken in that case.
//!  * `GET /listen` pops the oldest recognized utterance off the queue
//!    without blocking. An empty queue answers `{"status": "no_speech"}`
//!    with a 200 — queue state is payload, not transport failure.
//!
//! There is no caller authentication or rate limiting on this surface; it
//! is meant for a trusted local client.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::queue::RecognizedTextQueue;
use crate::tts_engine::SharedSpeaker;

/// Shared state injected into both handlers.
#[derive(Clone)]
pub struct ApiState {
    pub queue: Arc<RecognizedTextQueue>,
    pub speaker: SharedSpeaker,
}

/// Build the two-route router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/speak", post(speak))
        .route("/listen", get(listen))
        .with_state(state)
}

/// Bind and serve the interactive channel until the process exits.
pub async fn serve(state: ApiState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind interactive channel on {addr}"))?;
    log::info!("Interactive channel listening on {addr}");
    axum::serve(listener, router(state))
        .await
        .context("interactive channel server error")?;
    Ok(())
}

#[derive(Deserialize)]
struct SpeakRequest {
    #[serde(default)]
    text: String,
}

async fn speak(
    State(state): State<ApiState>,
    Json(request): Json<SpeakRequest>,
) -> (StatusCode, Json<Value>) {
    if request.text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "No text provided" })),
        );
    }

    log::info!("Interactive speak request: {}", request.text);
    if let Err(e) = state.speaker.lock().await.speak(&request.text).await {
        log::error!("Error during TTS: {e:#}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "message": "Speech synthesis failed" })),
        );
    }

    (
        StatusCode::OK,
        Json(json!({ "status": "success", "spoken": request.text })),
    )
}

async fn listen(State(state): State<ApiState>) -> (StatusCode, Json<Value>) {
    match state.queue.try_pop() {
        Some(text) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "text": text })),
        ),
        None => (
            StatusCode::OK,
            Json(json!({ "status": "no_speech", "text": "" })),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tts_engine::Speak;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    /// Speaker double that records every utterance it is asked to render.
    struct RecordingSpeaker {
        spoken: Arc<StdMutex<Vec<String>>>,
    }

    #[async_trait]
    impl Speak for RecordingSpeaker {
        async fn speak(&mut self, text: &str) -> anyhow::Result<()> {
            self.spoken.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn test_state() -> (ApiState, Arc<StdMutex<Vec<String>>>) {
        let spoken = Arc::new(StdMutex::new(Vec::new()));
        let speaker: SharedSpeaker = Arc::new(Mutex::new(RecordingSpeaker {
            spoken: spoken.clone(),
        }));
        let state = ApiState {
            queue: Arc::new(RecognizedTextQueue::new()),
            speaker,
        };
        (state, spoken)
    }

    #[tokio::test]
    async fn speak_forwards_text_to_speaker_exactly_once() {
        let (state, spoken) = test_state();
        let (status, Json(body)) = speak(
            State(state),
            Json(SpeakRequest {
                text: "Ẹhh ẹhhh! Ba ơi!".to_string(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["spoken"], "Ẹhh ẹhhh! Ba ơi!");
        assert_eq!(spoken.lock().unwrap().as_slice(), ["Ẹhh ẹhhh! Ba ơi!"]);
    }

    #[tokio::test]
    async fn speak_rejects_empty_text_without_speaking() {
        let (state, spoken) = test_state();
        let (status, Json(body)) = speak(
            State(state),
            Json(SpeakRequest {
                text: String::new(),
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "No text provided");
        assert!(spoken.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn listen_pops_queued_text_then_reports_no_speech() {
        let (state, _) = test_state();
        state.queue.push("mi nói chuyện".to_string());

        let (status, Json(body)) = listen(State(state.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["text"], "mi nói chuyện");

        let (status, Json(body)) = listen(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "no_speech");
        assert_eq!(body["text"], "");
    }
}
