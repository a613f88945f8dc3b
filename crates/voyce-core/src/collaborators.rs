//! Contracts for the external collaborators the core consumes.
//!
//! The core never talks to microphones, synthesizers, or geolocation hardware
//! directly; it drives these narrow async traits. Implementations live
//! outside the core (see the `voyce-voice` crate for scripted and remote
//! backends).

use crate::error::VoyceResult;
use crate::shared::GeoLocation;
use async_trait::async_trait;

/// One recognition result from the speech-input collaborator.
#[derive(Debug, Clone)]
pub struct RecognizedUtterance {
    pub transcript: String,
    pub confidence: f32,
}

/// Speech recognition. May fail with recoverable errors (permission denied,
/// no speech, network); the orchestrator surfaces those as status messages
/// and stays ready to retry.
#[async_trait]
pub trait SpeechInput: Send + Sync {
    /// Listen for one utterance in the given language (ISO 639-1 code).
    async fn start_listening(&self, language: &str) -> VoyceResult<RecognizedUtterance>;

    /// Abort an in-flight recognition, if any.
    fn stop_listening(&self);
}

/// Speech synthesis. Fire-and-continue: implementations must resolve even on
/// synthesis failure and never propagate a hard error into the turn loop.
#[async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, language: &str) -> VoyceResult<()>;
}

/// Geolocation. On failure the orchestrator proceeds with no location and
/// location-dependent handlers use their default-city fallback.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> VoyceResult<GeoLocation>;
}
