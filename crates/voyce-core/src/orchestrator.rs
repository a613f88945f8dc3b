//! Conversation Orchestrator - the session-level coordination layer.
//!
//! One orchestrator per session drives the turn loop: transcript in,
//! classify, generate, append to the log, speak, and - when the response is
//! flagged - arm the escalation controller. All turn state transitions are
//! serialized through `&mut self`; the escalation timer is the only
//! autonomous background activity and is torn down with the session.
//!
//! ```text
//! transcript ──> Intent ──> ResponseGenerator ──> log + speech output
//!                              │                        │
//!                              └─ TranslationResolver   └─ auto_escalate?
//!                                   (cache / remote /        │
//!                                    lexicon fallback)  EscalationController
//! ```

use crate::collaborators::{LocationProvider, SpeechInput, SpeechOutput};
use crate::error::VoyceError;
use crate::escalation::{EscalationConfig, EscalationController, EscalationStatus};
use crate::intent::Intent;
use crate::lexicon::{LexiconStore, UNIVERSAL_EMERGENCY_NUMBER};
use crate::response::ResponseGenerator;
use crate::shared::{
    language_name, ConnectionStatus, ConversationContext, ConversationLog, FeatureFlags,
    GeoLocation, Mood, Sender, Utterance,
};
use crate::translate::{CacheStats, RemoteTranslator, TranslationResolver};
use std::sync::Arc;
use tracing::{info, warn};

/// How a turn ended. `Retryable` means a fault was surfaced as a status
/// message and the session is ready for another attempt; nothing is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed,
    Retryable,
    /// The request was rejected because the assistant is mid-utterance.
    RejectedWhileSpeaking,
}

pub struct ConversationOrchestrator {
    resolver: Arc<TranslationResolver>,
    generator: ResponseGenerator,
    escalation: EscalationController,
    speech_in: Arc<dyn SpeechInput>,
    speech_out: Arc<dyn SpeechOutput>,
    locations: Arc<dyn LocationProvider>,
    log: ConversationLog,
    connection: ConnectionStatus,
    features: FeatureFlags,
    language: String,
    location: Option<GeoLocation>,
    status: String,
    speaking: bool,
}

const SAFE_PHRASES: &[&str] = &["i'm safe", "i am safe", "im safe"];

impl ConversationOrchestrator {
    pub fn new(
        speech_in: Arc<dyn SpeechInput>,
        speech_out: Arc<dyn SpeechOutput>,
        locations: Arc<dyn LocationProvider>,
        remote: Option<Arc<dyn RemoteTranslator>>,
        escalation_config: EscalationConfig,
    ) -> Self {
        let lexicon = LexiconStore::shared();
        let resolver = Arc::new(TranslationResolver::new(lexicon.clone(), remote));
        let generator = ResponseGenerator::new(lexicon.clone(), resolver.clone());
        let log = ConversationLog::new();
        let escalation = EscalationController::new(
            escalation_config,
            lexicon,
            log.clone(),
            locations.clone(),
        );
        Self {
            resolver,
            generator,
            escalation,
            speech_in,
            speech_out,
            locations,
            log,
            connection: ConnectionStatus::offline(),
            features: FeatureFlags::default(),
            language: "en".to_string(),
            location: None,
            status: "Initializing...".to_string(),
            speaking: false,
        }
    }

    /// Brings the session up: records connectivity, fetches the location
    /// (continuing with none on failure), sets the capability flags, and
    /// posts the welcome message. Initialization never fails outward; a
    /// failed collaborator only degrades the matching feature.
    pub async fn initialize(&mut self, online: bool) {
        self.status = "Initializing VOYCE...".to_string();
        self.connection = if online {
            ConnectionStatus::online()
        } else {
            info!("no backend connectivity, running in offline mode");
            ConnectionStatus::offline()
        };

        match self.locations.current_location().await {
            Ok(location) => {
                info!(city = ?location.city, country = ?location.country, "location acquired");
                self.location = Some(location);
                self.features.gps = true;
            }
            Err(e) => {
                warn!(error = %e, "location unavailable, continuing without it");
                self.features.gps = false;
            }
        }

        self.features.speech = true;
        self.features.offline = true;
        self.features.culture = true;

        self.log.append(
            Sender::System,
            "Welcome to VOYCE! I'm your AI travel companion ready to help with translations, cultural guidance, navigation, and emergency assistance.",
        );
        self.status = "Ready! Tap the microphone to start".to_string();
    }

    /// Runs one full conversation turn for a recognized transcript.
    pub async fn handle_transcript(&mut self, transcript: &str) -> TurnOutcome {
        // The safe phrase cancels a live countdown before anything else so
        // the emergency keyword in an explanation ("I said help but I'm
        // safe") cannot re-trigger classification.
        if self.escalation.status() == EscalationStatus::Counting && is_safe_phrase(transcript) {
            self.log.append(Sender::User, transcript);
            self.escalation.cancel();
            self.status = "Ready - tap to speak again".to_string();
            return TurnOutcome::Completed;
        }

        let utterance = Utterance::new(transcript, &self.language);
        self.log.append(Sender::User, &utterance.text);
        let context = self.context_snapshot(&utterance.text);
        let intent = Intent::classify(&utterance.text);
        info!(?intent, mood = ?context.mood, "transcript classified");

        let response = match self
            .generator
            .generate(intent, &utterance.text, &context, &self.connection)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // The generator is designed not to fail; this is the
                // defensive recover-and-continue path.
                warn!(error = %e, "response generation failed");
                self.log.append(
                    Sender::System,
                    "Sorry, I encountered an error processing your request. Please try again.",
                );
                self.status = "Error occurred - tap to try again".to_string();
                return TurnOutcome::Retryable;
            }
        };

        self.log.append(Sender::Assistant, &response.text);
        if let Some(note) = &response.cultural_note {
            self.log
                .append(Sender::System, format!("💡 Cultural Tip: {}", note));
        }

        self.speak(&response.text).await;

        if response.auto_escalate {
            self.escalation.arm(self.location.clone());
        }
        TurnOutcome::Completed
    }

    /// Listens for one utterance and runs the resulting turn. Rejected while
    /// the assistant is speaking; recoverable speech faults become status
    /// and system messages, and the session stays ready to retry.
    pub async fn listen_once(&mut self) -> TurnOutcome {
        if self.speaking {
            warn!("listen request rejected while speaking");
            return TurnOutcome::RejectedWhileSpeaking;
        }

        self.status = "Listening... Speak now".to_string();
        match self.speech_in.start_listening(&self.language).await {
            Ok(recognized) => {
                self.status = "Processing...".to_string();
                self.handle_transcript(&recognized.transcript).await
            }
            Err(e) => {
                self.handle_speech_fault(e);
                TurnOutcome::Retryable
            }
        }
    }

    /// Manual emergency trigger (the panic button's softer sibling): runs an
    /// emergency turn as if the user had asked for help, with a hardcoded
    /// fallback response if even generation fails.
    pub async fn trigger_emergency(&mut self) -> TurnOutcome {
        self.log.append(Sender::System, "🚨 EMERGENCY MODE ACTIVATED");
        let context = self.context_snapshot("emergency help needed");
        match self
            .generator
            .generate(Intent::Emergency, "emergency help needed", &context, &self.connection)
            .await
        {
            Ok(response) => {
                self.log.append(Sender::Assistant, &response.text);
                self.speak(&response.text).await;
                if response.auto_escalate {
                    self.escalation.arm(self.location.clone());
                }
            }
            Err(e) => {
                warn!(error = %e, "emergency response generation failed, using fallback");
                let fallback = format!(
                    "🚨 EMERGENCY ASSISTANCE: Call local emergency services immediately. {}. Your location: {}. Stay calm, help is coming.",
                    UNIVERSAL_EMERGENCY_NUMBER,
                    self.location
                        .as_ref()
                        .and_then(|l| l.city.as_deref())
                        .unwrap_or("Location detection in progress")
                );
                self.log.append(Sender::Assistant, &fallback);
                self.speak(&fallback).await;
                self.escalation.arm(self.location.clone());
            }
        }
        TurnOutcome::Completed
    }

    /// Immediate protocol execution, skipping the countdown.
    pub async fn panic_button(&mut self) -> bool {
        self.escalation.panic(self.location.clone()).await
    }

    /// Cancels a live escalation countdown, if any.
    pub fn cancel_escalation(&mut self) -> bool {
        self.escalation.cancel()
    }

    pub fn set_language(&mut self, code: &str) {
        self.language = code.to_string();
        self.log.append(
            Sender::System,
            format!(
                "Language changed to {}. VOYCE will now respond in {} when possible.",
                language_name(code),
                code
            ),
        );
    }

    pub fn set_location(&mut self, location: Option<GeoLocation>) {
        self.location = location;
    }

    /// Connectivity transition (reconnect/drop); read as a snapshot by the
    /// resolver on each turn.
    pub fn set_connectivity(&mut self, online: bool) {
        self.connection = if online {
            ConnectionStatus::online()
        } else {
            ConnectionStatus::offline()
        };
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn status_line(&self) -> &str {
        &self.status
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn connection(&self) -> &ConnectionStatus {
        &self.connection
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn escalation(&self) -> &EscalationController {
        &self.escalation
    }

    /// Translation cache summary for status surfaces.
    pub fn translation_cache(&self) -> CacheStats {
        self.resolver.cache_stats()
    }

    /// Empties the translation cache; subsequent turns resolve fresh.
    pub fn clear_translation_cache(&self) {
        self.resolver.clear_cache();
    }

    /// Tears the session down, stopping any escalation timers.
    pub fn shutdown(&mut self) {
        self.escalation.shutdown();
        self.status = "Session ended".to_string();
    }

    fn context_snapshot(&self, transcript: &str) -> ConversationContext {
        ConversationContext {
            location: self.location.clone(),
            language: self.language.clone(),
            history: self.log.snapshot(),
            mood: Mood::detect(transcript),
        }
    }

    async fn speak(&mut self, text: &str) {
        self.speaking = true;
        self.status = "Speaking...".to_string();
        // Fire-and-continue: synthesis failure never fails the turn.
        if let Err(e) = self.speech_out.speak(text, &self.language).await {
            warn!(error = %e, "speech synthesis failed");
        }
        self.speaking = false;
        self.status = "Ready - tap to speak again".to_string();
    }

    fn handle_speech_fault(&mut self, error: VoyceError) {
        if error.is_permission_fault() {
            self.features.speech = false;
            self.log.append(
                Sender::System,
                "Microphone access denied. Please enable it in your browser settings for voice features.",
            );
            self.status =
                "Limited functionality - enable microphone for voice features".to_string();
        } else {
            self.log.append(
                Sender::System,
                format!("Voice recognition error: {}. You can try speaking again.", error),
            );
            self.status = format!("Speech error: {} - Tap to try again", error);
        }
    }
}

fn is_safe_phrase(transcript: &str) -> bool {
    let lower = transcript.to_lowercase();
    SAFE_PHRASES.iter().any(|p| lower.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecognizedUtterance;
    use crate::error::VoyceResult;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct QueueInput {
        transcripts: Mutex<VecDeque<VoyceResult<String>>>,
    }

    impl QueueInput {
        fn new(items: Vec<VoyceResult<String>>) -> Self {
            Self {
                transcripts: Mutex::new(items.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl SpeechInput for QueueInput {
        async fn start_listening(&self, _language: &str) -> VoyceResult<RecognizedUtterance> {
            match self.transcripts.lock().unwrap().pop_front() {
                Some(Ok(transcript)) => Ok(RecognizedUtterance {
                    transcript,
                    confidence: 0.9,
                }),
                Some(Err(e)) => Err(e),
                None => Err(VoyceError::NoSpeechDetected),
            }
        }

        fn stop_listening(&self) {}
    }

    struct SilentOutput;

    #[async_trait]
    impl SpeechOutput for SilentOutput {
        async fn speak(&self, _text: &str, _language: &str) -> VoyceResult<()> {
            Ok(())
        }
    }

    struct ChennaiProvider;

    #[async_trait]
    impl LocationProvider for ChennaiProvider {
        async fn current_location(&self) -> VoyceResult<GeoLocation> {
            Ok(GeoLocation {
                lat: 13.0827,
                lng: 80.2707,
                accuracy: 12.0,
                city: Some("Chennai".to_string()),
                country: Some("India".to_string()),
                region: Some("Tamil Nadu".to_string()),
            })
        }
    }

    struct NoLocation;

    #[async_trait]
    impl LocationProvider for NoLocation {
        async fn current_location(&self) -> VoyceResult<GeoLocation> {
            Err(VoyceError::Location("position unavailable".to_string()))
        }
    }

    fn orchestrator(input: QueueInput) -> ConversationOrchestrator {
        ConversationOrchestrator::new(
            Arc::new(input),
            Arc::new(SilentOutput),
            Arc::new(ChennaiProvider),
            None,
            EscalationConfig {
                countdown_secs: 3,
                tick_period: Duration::from_secs(1),
                followup_delay: Duration::from_secs(1),
                tracking_interval: Duration::from_secs(1),
                tracking_cap: Duration::from_secs(2),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_turn_appends_user_assistant_and_note() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;
        session.set_language("ta");

        let outcome = session.handle_transcript("How do I say hello in Tamil?").await;
        assert_eq!(outcome, TurnOutcome::Completed);

        let log = session.log().snapshot();
        // welcome, language change, user, assistant, cultural tip
        assert_eq!(log.len(), 5);
        assert_eq!(log[2].sender, Sender::User);
        assert_eq!(log[3].sender, Sender::Assistant);
        assert!(log[3].text.contains("வணக்கம்"));
        assert!(log[4].text.starts_with("💡 Cultural Tip:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_translation_turns_fill_cache_until_cleared() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;
        session.set_language("ta");
        assert_eq!(session.translation_cache().size, 0);

        session.handle_transcript("How do I say hello in Tamil?").await;
        let stats = session.translation_cache();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.target_languages, vec!["ta".to_string()]);

        session.clear_translation_cache();
        assert_eq!(session.translation_cache().size, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emergency_turn_arms_escalation() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;

        session.handle_transcript("I need emergency help now").await;
        assert_eq!(session.escalation().status(), EscalationStatus::Counting);
        assert_eq!(session.escalation().state().remaining_secs, 3);

        let log = session.log().snapshot();
        let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
        assert!(assistant.text.contains("108 - Medical Emergency"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_safe_phrase_cancels_countdown() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;

        session.handle_transcript("emergency help").await;
        assert_eq!(session.escalation().status(), EscalationStatus::Counting);

        session.handle_transcript("It's okay, I'm safe").await;
        assert_eq!(session.escalation().status(), EscalationStatus::Idle);
        assert_eq!(session.log().count_containing("escalation cancelled"), 1);
        // The safe phrase must not be re-classified as an Emergency turn.
        assert_eq!(
            session.log().count_containing("EMERGENCY ASSISTANCE"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unattended_countdown_executes_protocol() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;

        session.handle_transcript("emergency help").await;
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(session.escalation().status(), EscalationStatus::Idle);
        assert_eq!(
            session
                .log()
                .count_containing("📞 Emergency services contacted. Location: Chennai"),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_failure_degrades_to_default_city_data() {
        let mut session = ConversationOrchestrator::new(
            Arc::new(QueueInput::new(vec![])),
            Arc::new(SilentOutput),
            Arc::new(NoLocation),
            None,
            EscalationConfig::default(),
        );
        session.initialize(false).await;
        assert!(!session.features().gps);

        session.handle_transcript("what are the local customs").await;
        let log = session.log().snapshot();
        let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
        // Default-city fallback data.
        assert!(assistant.text.contains("Remove shoes before entering homes"));
        session.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_speech_faults_surface_and_session_continues() {
        let input = QueueInput::new(vec![
            Err(VoyceError::PermissionDenied),
            Ok("hello there".to_string()),
        ]);
        let mut session = orchestrator(input);
        session.initialize(false).await;

        let outcome = session.listen_once().await;
        assert_eq!(outcome, TurnOutcome::Retryable);
        assert!(!session.features().speech);
        assert!(session.status_line().contains("Limited functionality"));

        // Still operating in degraded mode.
        let outcome = session.listen_once().await;
        assert_eq!(outcome, TurnOutcome::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_transcript_is_a_general_turn() {
        let mut session = orchestrator(QueueInput::new(vec![]));
        session.initialize(false).await;
        let outcome = session.handle_transcript("").await;
        assert_eq!(outcome, TurnOutcome::Completed);
        let log = session.log().snapshot();
        let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
        assert!(assistant.text.contains("travel companion"));
    }
}
