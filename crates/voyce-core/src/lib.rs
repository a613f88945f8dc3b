//! # VOYCE Core - Conversation Orchestration and Emergency Escalation
//!
//! Session core for the VOYCE voice travel companion: intent classification
//! over transcripts, connectivity-aware translation resolution with caching
//! and graceful degradation, per-intent response generation, and a
//! time-boxed, cancellable emergency escalation protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                 Conversation Orchestrator                    │
//! │  ┌────────────┐   ┌─────────────────┐   ┌────────────────┐  │
//! │  │   Intent   │ → │    Response     │ → │  Conversation  │  │
//! │  │ Classifier │   │    Generator    │   │      Log       │  │
//! │  └────────────┘   └────────┬────────┘   └────────────────┘  │
//! │                            ↓                     ↑           │
//! │                 ┌─────────────────────┐  ┌──────────────┐   │
//! │                 │ Translation Resolver│  │  Escalation  │   │
//! │                 │ (cache→remote→local)│  │  Controller  │   │
//! │                 └─────────────────────┘  └──────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Speech recognition, synthesis, and geolocation are external collaborators
//! behind the traits in [`collaborators`]; backends live in `voyce-voice`.

pub mod collaborators;
pub mod error;
pub mod escalation;
pub mod intent;
pub mod lexicon;
pub mod orchestrator;
pub mod response;
pub mod shared;
pub mod translate;

pub use collaborators::{LocationProvider, RecognizedUtterance, SpeechInput, SpeechOutput};
pub use error::{VoyceError, VoyceResult};
pub use escalation::{
    EscalationConfig, EscalationController, EscalationState, EscalationStatus, TickOutcome,
};
pub use intent::Intent;
pub use lexicon::{CityCulture, LexiconStore, LocalMatch, UNIVERSAL_EMERGENCY_NUMBER};
pub use orchestrator::{ConversationOrchestrator, TurnOutcome};
pub use response::{AssistantResponse, Priority, ResponseGenerator};
pub use shared::{
    bcp47_tag, language_name, ConnectionStatus, ConversationContext, ConversationLog,
    ConversationMessage, FeatureFlags, GeoLocation, Mood, Sender, Utterance,
    SUPPORTED_LANGUAGES,
};
pub use translate::{
    CacheStats, Provenance, RemoteRequest, RemoteTranslation, RemoteTranslator, SarvamTranslator,
    TranslationResolver, TranslationResult,
};
