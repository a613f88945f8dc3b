//! Collaborator backends for the VOYCE core.
//!
//! The core only knows the `SpeechInput` / `SpeechOutput` /
//! `LocationProvider` traits; this crate provides the concrete ends:
//! scripted input for tests and demos, tracing/remote speech output, and
//! fixed or unavailable location providers.

pub mod location;
pub mod output;
pub mod scripted;

pub use location::{FixedLocationProvider, UnavailableLocationProvider};
pub use output::{RemoteSpeechOutput, TracingSpeechOutput};
pub use scripted::{DeniedSpeechInput, ScriptedSpeechInput};
