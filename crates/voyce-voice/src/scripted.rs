//! Scripted speech input: a queue of canned transcripts standing in for a
//! real recognizer. Used by tests, the console, and demos, the same way the
//! original prototype fed mock transcripts when no recognizer was present.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tracing::debug;
use voyce_core::{RecognizedUtterance, SpeechInput, VoyceError, VoyceResult};

/// Returns queued transcripts in order; `NoSpeechDetected` once drained.
#[derive(Debug, Default)]
pub struct ScriptedSpeechInput {
    queue: Mutex<VecDeque<String>>,
}

impl ScriptedSpeechInput {
    pub fn new(transcripts: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            queue: Mutex::new(transcripts.into_iter().map(Into::into).collect()),
        }
    }

    /// Appends another transcript to the script.
    pub fn push(&self, transcript: impl Into<String>) {
        self.queue
            .lock()
            .expect("script queue poisoned")
            .push_back(transcript.into());
    }

    pub fn remaining(&self) -> usize {
        self.queue.lock().expect("script queue poisoned").len()
    }
}

#[async_trait]
impl SpeechInput for ScriptedSpeechInput {
    async fn start_listening(&self, language: &str) -> VoyceResult<RecognizedUtterance> {
        let next = self.queue.lock().expect("script queue poisoned").pop_front();
        match next {
            Some(transcript) => {
                debug!(language, %transcript, "scripted transcript served");
                Ok(RecognizedUtterance {
                    transcript,
                    confidence: 0.9,
                })
            }
            None => Err(VoyceError::NoSpeechDetected),
        }
    }

    fn stop_listening(&self) {}
}

/// Always reports a denied microphone permission. For exercising the
/// degraded-mode path.
#[derive(Debug, Default)]
pub struct DeniedSpeechInput;

#[async_trait]
impl SpeechInput for DeniedSpeechInput {
    async fn start_listening(&self, _language: &str) -> VoyceResult<RecognizedUtterance> {
        Err(VoyceError::PermissionDenied)
    }

    fn stop_listening(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_queue_drains_in_order() {
        let input = ScriptedSpeechInput::new(["hello", "goodbye"]);
        assert_eq!(input.remaining(), 2);
        let first = input.start_listening("en").await.unwrap();
        assert_eq!(first.transcript, "hello");
        let second = input.start_listening("en").await.unwrap();
        assert_eq!(second.transcript, "goodbye");
        assert!(matches!(
            input.start_listening("en").await,
            Err(VoyceError::NoSpeechDetected)
        ));
    }

    #[tokio::test]
    async fn test_push_extends_a_drained_script() {
        let input = ScriptedSpeechInput::default();
        assert!(matches!(
            input.start_listening("en").await,
            Err(VoyceError::NoSpeechDetected)
        ));

        input.push("where is the station");
        assert_eq!(input.remaining(), 1);
        let next = input.start_listening("en").await.unwrap();
        assert_eq!(next.transcript, "where is the station");
        assert_eq!(input.remaining(), 0);
    }
}
