//! Shared types used across the VOYCE crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// -----------------------------------------------------------------------------
// Utterances and location
// -----------------------------------------------------------------------------

/// A recognized user utterance as handed over by the speech-input collaborator.
/// Immutable; consumed exactly once by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    /// Language the user spoke in (ISO 639-1 code, e.g. "en", "ta").
    pub language: String,
    pub received_at: DateTime<Utc>,
}

impl Utterance {
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: language.into(),
            received_at: Utc::now(),
        }
    }
}

/// Structured place as reported by the location collaborator. City/country may
/// be absent when reverse geocoding is unavailable; handlers fall back to the
/// default city's data in that case.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeoLocation {
    pub lat: f64,
    pub lng: f64,
    /// Reported accuracy in meters.
    pub accuracy: f64,
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
}

impl GeoLocation {
    /// Display label used in user-facing messages.
    pub fn city_label(&self) -> &str {
        self.city.as_deref().unwrap_or("Unknown")
    }
}

// -----------------------------------------------------------------------------
// Conversation log
// -----------------------------------------------------------------------------

/// Who produced a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only conversation history shared between the orchestrator and the
/// escalation controller (the controller appends system messages from its
/// timer task). Messages are never mutated or removed, and timestamps are
/// non-decreasing in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    inner: Arc<Mutex<Vec<ConversationMessage>>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns a copy of it. The timestamp is clamped
    /// so it never goes backwards relative to the previous entry.
    pub fn append(&self, sender: Sender, text: impl Into<String>) -> ConversationMessage {
        let mut messages = self.inner.lock().expect("conversation log poisoned");
        let mut timestamp = Utc::now();
        if let Some(last) = messages.last() {
            if last.timestamp > timestamp {
                timestamp = last.timestamp;
            }
        }
        let message = ConversationMessage {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp,
        };
        messages.push(message.clone());
        message
    }

    /// Point-in-time copy of the history.
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.inner.lock().expect("conversation log poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("conversation log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Count of messages whose text contains the given fragment. Used by
    /// tests and by the console to summarize escalation chatter.
    pub fn count_containing(&self, fragment: &str) -> usize {
        self.inner
            .lock()
            .expect("conversation log poisoned")
            .iter()
            .filter(|m| m.text.contains(fragment))
            .count()
    }
}

// -----------------------------------------------------------------------------
// Mood
// -----------------------------------------------------------------------------

/// Coarse mood tag detected from the transcript. Used to tint responses; not
/// a safety signal (emergency routing is keyword-based in the classifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Urgent,
    #[default]
    Neutral,
}

impl Mood {
    const HAPPY: &'static [&'static str] = &["great", "awesome", "wonderful", "excited", "amazing"];
    const SAD: &'static [&'static str] = &["lost", "confused", "worried", "scared", "frustrated"];
    const URGENT: &'static [&'static str] = &["emergency", "urgent", "quickly", "now", "help"];

    /// First matching keyword set wins; anything else is neutral.
    pub fn detect(transcript: &str) -> Mood {
        let lower = transcript.to_lowercase();
        let hit = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
        if hit(Self::HAPPY) {
            Mood::Happy
        } else if hit(Self::SAD) {
            Mood::Sad
        } else if hit(Self::URGENT) {
            Mood::Urgent
        } else {
            Mood::Neutral
        }
    }
}

// -----------------------------------------------------------------------------
// Per-turn context and session status
// -----------------------------------------------------------------------------

/// Read-only snapshot handed to the response generator each turn. Owned state
/// lives in the orchestrator; handlers never see shared mutable session state.
#[derive(Debug, Clone)]
pub struct ConversationContext {
    pub location: Option<GeoLocation>,
    /// Target language selected for the session (ISO 639-1 code).
    pub language: String,
    pub history: Vec<ConversationMessage>,
    pub mood: Mood,
}

impl ConversationContext {
    /// City name for user-facing text, or the generic area wording.
    pub fn city_display(&self) -> &str {
        self.location
            .as_ref()
            .and_then(|l| l.city.as_deref())
            .unwrap_or("your area")
    }
}

/// Connectivity snapshot. Set at initialization and on reconnect transitions;
/// the translation resolver reads it per call, never holds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub offline_mode: bool,
    pub last_sync: Option<DateTime<Utc>>,
}

impl ConnectionStatus {
    pub fn online() -> Self {
        Self {
            connected: true,
            offline_mode: false,
            last_sync: Some(Utc::now()),
        }
    }

    pub fn offline() -> Self {
        Self {
            connected: false,
            offline_mode: true,
            last_sync: None,
        }
    }

    /// True when remote lookups should be attempted.
    pub fn is_online(&self) -> bool {
        self.connected && !self.offline_mode
    }
}

/// Capability flags for the session. A denied permission leaves the matching
/// flag false; the session keeps running in degraded mode.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    pub speech: bool,
    pub gps: bool,
    pub offline: bool,
    pub culture: bool,
}

// -----------------------------------------------------------------------------
// Languages
// -----------------------------------------------------------------------------

/// Languages the assistant can translate into offline.
pub const SUPPORTED_LANGUAGES: &[(&str, &str, &str)] = &[
    ("en", "English", "English"),
    ("ta", "Tamil", "தமிழ்"),
    ("hi", "Hindi", "हिन्दी"),
    ("es", "Spanish", "Español"),
    ("fr", "French", "Français"),
    ("de", "German", "Deutsch"),
    ("it", "Italian", "Italiano"),
    ("pt", "Portuguese", "Português"),
    ("ja", "Japanese", "日本語"),
    ("ko", "Korean", "한국어"),
    ("zh", "Chinese", "中文"),
    ("ar", "Arabic", "العربية"),
];

/// English display name for a language code, falling back to the code itself.
pub fn language_name(code: &str) -> &str {
    SUPPORTED_LANGUAGES
        .iter()
        .find(|(c, _, _)| *c == code)
        .map(|(_, name, _)| *name)
        .unwrap_or(code)
}

/// BCP-47 tag used by speech backends for the given language code.
pub fn bcp47_tag(code: &str) -> &'static str {
    match code {
        "es" => "es-ES",
        "fr" => "fr-FR",
        "de" => "de-DE",
        "it" => "it-IT",
        "pt" => "pt-PT",
        "hi" => "hi-IN",
        "ta" => "ta-IN",
        "ja" => "ja-JP",
        "ko" => "ko-KR",
        "zh" => "zh-CN",
        "ar" => "ar-SA",
        _ => "en-US",
    }
}
