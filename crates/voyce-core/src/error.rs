//! Error types for the VOYCE conversation core.

use thiserror::Error;

/// Result type alias for core operations
pub type VoyceResult<T> = Result<T, VoyceError>;

/// Errors that can occur in the conversation and escalation core.
///
/// All of these are recoverable at the session level: the orchestrator
/// downgrades them to status/system messages and keeps the session alive.
#[derive(Error, Debug)]
pub enum VoyceError {
    #[error("Speech recognition error: {0}")]
    Recognition(String),

    #[error("Microphone access denied")]
    PermissionDenied,

    #[error("No speech detected")]
    NoSpeechDetected,

    #[error("Speech synthesis error: {0}")]
    Synthesis(String),

    #[error("Location error: {0}")]
    Location(String),

    #[error("Translation backend error: {0}")]
    Translation(String),

    #[error("Escalation error: {0}")]
    Escalation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VoyceError {
    /// True when the fault should be surfaced as a persistent status line
    /// (capability stays disabled) rather than a transient retry hint.
    pub fn is_permission_fault(&self) -> bool {
        matches!(self, VoyceError::PermissionDenied)
    }
}
