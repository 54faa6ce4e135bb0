//! Speaker verification capability.
//!
//! The loop only ever asks "is this Ba's voice?" through the
//! [`VoiceAuthenticator`] trait. The shipped implementation is
//! [`AlwaysAccept`], a placeholder that approves every utterance — real
//! verification would compare a voice embedding against Ba's enrolled
//! signature and slot in here as another implementation.

use crate::capture::Utterance;

/// Decides whether an utterance belongs to the enrolled speaker.
pub trait VoiceAuthenticator: Send {
    fn authenticate(&self, utterance: &Utterance) -> bool;
}

/// Placeholder verifier that accepts every voice.
///
/// TODO: replace with an embedding-match implementation once a speaker
/// model for Ba is enrolled.
pub struct AlwaysAccept;

impl VoiceAuthenticator for AlwaysAccept {
    fn authenticate(&self, _utterance: &Utterance) -> bool {
        log::info!("Voice authenticated: Ba's voice detected.");
        true
    }
}
