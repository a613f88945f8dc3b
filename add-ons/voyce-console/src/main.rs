//! VOYCE console session.
//!
//! A thin REPL over the conversation core: each typed line is treated as a
//! recognized transcript and run through a full turn. Slash commands cover
//! the session controls (language, panic button, cancellation, status).

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voyce_core::{
    ConversationOrchestrator, EscalationConfig, SarvamTranslator, Sender, RemoteTranslator,
    SUPPORTED_LANGUAGES,
};
use voyce_voice::{FixedLocationProvider, ScriptedSpeechInput, TracingSpeechOutput};

const HELP: &str = "\
Commands:
  /lang <code>   switch session language (e.g. /lang ta)
  /langs         list supported languages
  /emergency     manual emergency turn
  /panic         immediate emergency protocol (no countdown)
  /safe          cancel a running escalation countdown
  /status        session status, connectivity, and escalation state
  /clear-cache   empty the translation cache
  /quit          end the session
Anything else is handled as a spoken transcript.";

#[tokio::main]
async fn main() {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[voyce-console] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let remote = match SarvamTranslator::from_env() {
        Ok(Some(translator)) => {
            tracing::info!("remote translation backend configured");
            Some(Arc::new(translator) as Arc<dyn RemoteTranslator>)
        }
        Ok(None) => {
            tracing::info!("no SARVAM_API_KEY, offline lexicon only");
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, "remote translator setup failed, offline lexicon only");
            None
        }
    };
    let online = remote.is_some();

    let mut session = ConversationOrchestrator::new(
        // The console types transcripts; the scripted input only backs /listen-style flows.
        Arc::new(ScriptedSpeechInput::default()),
        Arc::new(TracingSpeechOutput),
        Arc::new(FixedLocationProvider::chennai()),
        remote,
        EscalationConfig::default(),
    );
    session.initialize(online).await;

    println!("VOYCE travel companion console. {}", HELP);
    print_new_messages(&session, 0).await;

    let mut seen = session.log().len();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await;
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" => break,
            "/help" => println!("{}", HELP),
            "/langs" => {
                for (code, name, native) in SUPPORTED_LANGUAGES {
                    println!("  {}  {} ({})", code, name, native);
                }
            }
            "/emergency" => {
                session.trigger_emergency().await;
            }
            "/panic" => {
                if !session.panic_button().await {
                    println!("(escalation already active)");
                }
            }
            "/safe" => {
                if !session.cancel_escalation() {
                    println!("(no countdown to cancel)");
                }
            }
            "/status" => {
                println!("status: {}", session.status_line());
                println!(
                    "connectivity: {}",
                    serde_json::to_string(session.connection()).unwrap_or_default()
                );
                println!("escalation: {:?}", session.escalation().state().status);
                println!("language: {}", session.language());
                let cache = session.translation_cache();
                println!(
                    "translation cache: {} entries ({})",
                    cache.size,
                    cache.target_languages.join(", ")
                );
            }
            "/clear-cache" => {
                session.clear_translation_cache();
                println!("translation cache cleared");
            }
            _ if line.starts_with("/lang ") => {
                let code = line.trim_start_matches("/lang ").trim();
                session.set_language(code);
            }
            _ if line.starts_with('/') => println!("unknown command. {}", HELP),
            transcript => {
                session.handle_transcript(transcript).await;
            }
        }

        seen = print_new_messages(&session, seen).await;
    }

    session.shutdown();
    println!("Session ended.");
}

async fn prompt() {
    let mut stdout = tokio::io::stdout();
    let _ = stdout.write_all(b"you> ").await;
    let _ = stdout.flush().await;
}

/// Prints log entries appended since the last call (the escalation timer
/// appends between turns too) and returns the new high-water mark.
async fn print_new_messages(session: &ConversationOrchestrator, seen: usize) -> usize {
    // Give just-armed timers a chance to post their first messages.
    tokio::task::yield_now().await;
    let messages = session.log().snapshot();
    for message in &messages[seen.min(messages.len())..] {
        let tag = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "voyce",
            Sender::System => "system",
        };
        println!("[{}] {}", tag, message.text);
    }
    messages.len()
}
