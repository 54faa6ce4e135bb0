//! Recognized-text hand-off between the interaction loop and the HTTP
//! surface.
//!
//! A thin wrapper over an unbounded `tokio::sync::mpsc` channel: the loop
//! pushes every successfully transcribed utterance, an HTTP client drains
//! them one at a time via `GET /listen`. Reads never block — an empty
//! queue is reported as `None`. There is no capacity bound; if nobody
//! polls, entries accumulate (accepted for a best-effort status channel).

use std::sync::Mutex;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Unbounded FIFO of recognized-text strings, safe for one producer and
/// one consumer on different tasks.
pub struct RecognizedTextQueue {
    tx: UnboundedSender<String>,
    rx: Mutex<UnboundedReceiver<String>>,
}

impl RecognizedTextQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Enqueue one recognized utterance. The channel is unbounded and the
    /// queue owns both ends, so this cannot fail in practice.
    pub fn push(&self, text: String) {
        if self.tx.send(text).is_err() {
            log::warn!("recognized-text queue receiver dropped; discarding entry");
        }
    }

    /// Pop the oldest entry without blocking, or `None` when empty.
    pub fn try_pop(&self) -> Option<String> {
        // The mutex only guards against concurrent HTTP readers; it is
        // never held across an await point.
        let mut rx = self.rx.lock().unwrap_or_else(|e| e.into_inner());
        rx.try_recv().ok()
    }
}

impl Default for RecognizedTextQueue {
    fn default() -> Self {
        Self::new()
    }
}
