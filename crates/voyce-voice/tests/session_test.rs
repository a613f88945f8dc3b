//! End-to-end session flows: scripted speech input driving the core
//! orchestrator through full turns, escalation, and degraded modes.

use std::sync::Arc;
use std::time::Duration;
use voyce_core::{
    ConversationOrchestrator, EscalationConfig, EscalationStatus, Sender, TurnOutcome,
};
use voyce_voice::{
    DeniedSpeechInput, FixedLocationProvider, ScriptedSpeechInput, TracingSpeechOutput,
    UnavailableLocationProvider,
};

fn fast_escalation() -> EscalationConfig {
    EscalationConfig {
        countdown_secs: 3,
        tick_period: Duration::from_secs(1),
        followup_delay: Duration::from_secs(1),
        tracking_interval: Duration::from_secs(1),
        tracking_cap: Duration::from_secs(2),
    }
}

fn session(input: ScriptedSpeechInput) -> ConversationOrchestrator {
    ConversationOrchestrator::new(
        Arc::new(input),
        Arc::new(TracingSpeechOutput),
        Arc::new(FixedLocationProvider::chennai()),
        None,
        fast_escalation(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_tamil_greeting_session() {
    let input = ScriptedSpeechInput::new(["How do I say hello in Tamil?"]);
    let mut session = session(input);
    session.initialize(false).await;
    session.set_language("ta");

    let outcome = session.listen_once().await;
    assert_eq!(outcome, TurnOutcome::Completed);

    let log = session.log().snapshot();
    let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
    assert!(assistant.text.contains("வணக்கம்"));
    let tip = log
        .iter()
        .find(|m| m.text.starts_with("💡 Cultural Tip:"))
        .unwrap();
    assert!(tip.text.contains("palms pressed together"));
}

#[tokio::test(start_paused = true)]
async fn test_emergency_escalates_and_safe_phrase_cancels() {
    let input = ScriptedSpeechInput::new(["I need emergency help now", "I'm safe, thank you"]);
    let mut session = session(input);
    session.initialize(false).await;

    session.listen_once().await;
    assert_eq!(session.escalation().status(), EscalationStatus::Counting);
    assert_eq!(session.escalation().state().remaining_secs, 3);

    // One countdown tick goes by before the user reacts.
    tokio::time::sleep(Duration::from_millis(1500)).await;

    session.listen_once().await;
    assert_eq!(session.escalation().status(), EscalationStatus::Idle);
    assert_eq!(session.log().count_containing("escalation cancelled"), 1);

    // Long after the original deadline, the protocol never ran.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(
        session.log().count_containing("EMERGENCY PROTOCOL ACTIVATED"),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_emergency_runs_protocol() {
    let input = ScriptedSpeechInput::new(["urgent help please"]);
    let mut session = session(input);
    session.initialize(false).await;

    session.listen_once().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(session.escalation().status(), EscalationStatus::Idle);
    assert_eq!(
        session
            .log()
            .count_containing("📞 Emergency services contacted. Location: Chennai"),
        1
    );
    assert_eq!(session.log().count_containing("Help is on the way"), 1);
    assert_eq!(session.log().count_containing("tracking ended"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_panic_button_skips_countdown() {
    let mut session = session(ScriptedSpeechInput::new([] as [&str; 0]));
    session.initialize(false).await;

    assert!(session.panic_button().await);
    assert_eq!(session.escalation().status(), EscalationStatus::Idle);
    assert_eq!(session.log().count_containing("PANIC MODE ACTIVATED"), 1);
    assert_eq!(session.log().count_containing("Emergency escalation in"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_denied_microphone_degrades_but_session_survives() {
    let mut session = ConversationOrchestrator::new(
        Arc::new(DeniedSpeechInput),
        Arc::new(TracingSpeechOutput),
        Arc::new(FixedLocationProvider::chennai()),
        None,
        fast_escalation(),
    );
    session.initialize(false).await;

    let outcome = session.listen_once().await;
    assert_eq!(outcome, TurnOutcome::Retryable);
    assert!(!session.features().speech);
    assert_eq!(session.log().count_containing("Microphone access denied"), 1);

    // Typed transcripts still work in degraded mode.
    let outcome = session.handle_transcript("what are the local customs").await;
    assert_eq!(outcome, TurnOutcome::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_no_location_falls_back_to_universal_number() {
    let input = ScriptedSpeechInput::new(["emergency"]);
    let mut session = ConversationOrchestrator::new(
        Arc::new(input),
        Arc::new(TracingSpeechOutput),
        Arc::new(UnavailableLocationProvider),
        None,
        fast_escalation(),
    );
    session.initialize(false).await;
    assert!(!session.features().gps);

    session.listen_once().await;
    let log = session.log().snapshot();
    let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
    assert!(assistant.text.contains("112 - Universal Emergency Number"));

    // Protocol still runs with the unknown-location wording.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        session
            .log()
            .count_containing("📞 Emergency services contacted. Location: Unknown"),
        1
    );
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_mumbai_culture_data_is_city_keyed() {
    let input = ScriptedSpeechInput::new(["tell me about the local culture"]);
    let mut session = ConversationOrchestrator::new(
        Arc::new(input),
        Arc::new(TracingSpeechOutput),
        Arc::new(FixedLocationProvider::mumbai()),
        None,
        fast_escalation(),
    );
    session.initialize(false).await;

    session.listen_once().await;
    let log = session.log().snapshot();
    let assistant = log.iter().find(|m| m.sender == Sender::Assistant).unwrap();
    assert!(assistant.text.contains("Respect local train etiquette"));
}
