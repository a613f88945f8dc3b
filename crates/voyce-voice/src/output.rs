//! Speech output backends.
//!
//! Both honor the fire-and-continue contract: `speak` resolves even when
//! synthesis fails, so a broken synthesizer can never stall a turn.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use voyce_core::{bcp47_tag, SpeechOutput, VoyceError, VoyceResult};

/// Logs what would be spoken. The default output for tests and the console.
#[derive(Debug, Default)]
pub struct TracingSpeechOutput;

#[async_trait]
impl SpeechOutput for TracingSpeechOutput {
    async fn speak(&self, text: &str, language: &str) -> VoyceResult<()> {
        info!(voice = bcp47_tag(language), "🔊 {}", text);
        Ok(())
    }
}

/// OpenAI-compatible speech synthesis endpoint (`POST {base}/audio/speech`).
///
/// Uses `TTS_API_URL` (default `https://api.openai.com/v1`), `TTS_API_KEY`,
/// and `TTS_MODEL` (default `tts-1`). The synthesized audio is fetched and
/// discarded here; playback belongs to the surrounding application.
#[derive(Debug, Clone)]
pub struct RemoteSpeechOutput {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SpeechRequestBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

impl RemoteSpeechOutput {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoyceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(VoyceError::Http)?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        })
    }

    /// Build from environment: TTS_API_URL, TTS_API_KEY, TTS_MODEL.
    pub fn from_env() -> VoyceResult<Self> {
        let base_url = std::env::var("TTS_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let api_key = std::env::var("TTS_API_KEY")
            .map_err(|_| VoyceError::Config("TTS requires TTS_API_KEY".to_string()))?;
        let model = std::env::var("TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string());
        Self::new(base_url, api_key, model)
    }

    async fn synthesize(&self, text: &str) -> VoyceResult<usize> {
        let url = format!("{}/audio/speech", self.base_url.trim_end_matches('/'));
        let body = SpeechRequestBody {
            model: &self.model,
            input: text,
            voice: "alloy",
        };
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let audio = response.bytes().await?;
        Ok(audio.len())
    }
}

#[async_trait]
impl SpeechOutput for RemoteSpeechOutput {
    async fn speak(&self, text: &str, language: &str) -> VoyceResult<()> {
        match self.synthesize(text).await {
            Ok(bytes) => {
                debug!(bytes, voice = bcp47_tag(language), "speech synthesized");
            }
            Err(e) => {
                // Swallowed on purpose: synthesis failure must not fail the turn.
                warn!(error = %e, "remote speech synthesis failed, continuing");
            }
        }
        Ok(())
    }
}
