//! Translation resolution with caching and graceful degradation.
//!
//! Resolution order: cache, then the remote provider (only when the
//! connectivity snapshot says online and a provider is configured), then the
//! offline lexicon, then a low-confidence placeholder. The resolver never
//! fails outward; every fault collapses into the next lookup strategy.

use crate::error::{VoyceError, VoyceResult};
use crate::lexicon::LexiconStore;
use crate::shared::ConnectionStatus;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a translation result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    Remote,
    Cached,
    LocalFallback,
}

/// A resolved translation. `confidence` is in [0, 1]; degraded placeholder
/// results carry 0.1 and an explanatory note instead of an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationResult {
    pub translated_text: String,
    pub confidence: f32,
    pub pronunciation: Option<String>,
    pub cultural_note: Option<String>,
    pub source: Provenance,
    /// Lexicon category for local hits (greetings, courtesy, ...).
    pub category: Option<String>,
}

/// Request sent to a remote translation provider.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
    /// Formality mode ("formal" unless the caller overrides).
    pub mode: String,
}

/// Raw remote provider answer before lexicon enrichment.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteTranslation {
    pub translated_text: String,
    pub confidence: Option<f32>,
    pub pronunciation: Option<String>,
}

/// Remote translation provider contract. Any error is treated by the
/// resolver as a cache miss, never surfaced to the caller.
#[async_trait]
pub trait RemoteTranslator: Send + Sync {
    async fn translate(&self, request: &RemoteRequest) -> VoyceResult<RemoteTranslation>;
}

/// Sarvam-style HTTP translation backend (mayura:v1).
///
/// Configured from `SARVAM_API_KEY` and optionally `SARVAM_API_URL`; without
/// a key the session runs offline-only.
#[derive(Debug, Clone)]
pub struct SarvamTranslator {
    api_url: String,
    api_key: String,
    client: reqwest::Client,
}

const DEFAULT_SARVAM_URL: &str = "https://api.sarvam.ai/translate";

#[derive(Serialize)]
struct SarvamRequestBody<'a> {
    input: &'a str,
    source_language_code: &'a str,
    target_language_code: &'a str,
    speaker_gender: &'a str,
    mode: &'a str,
    model: &'a str,
    enable_preprocessing: bool,
}

#[derive(Deserialize)]
struct SarvamResponseBody {
    translated_text: String,
    confidence: Option<f32>,
    pronunciation: Option<String>,
}

impl SarvamTranslator {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> VoyceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(VoyceError::Http)?;
        Ok(Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Build from environment. Returns `None` (not an error) when no
    /// credential is configured, so callers fall back to offline data.
    pub fn from_env() -> VoyceResult<Option<Self>> {
        let api_key = match std::env::var("SARVAM_API_KEY") {
            Ok(key) if !key.is_empty() && key != "demo-key" => key,
            _ => return Ok(None),
        };
        let api_url =
            std::env::var("SARVAM_API_URL").unwrap_or_else(|_| DEFAULT_SARVAM_URL.to_string());
        Ok(Some(Self::new(api_url, api_key)?))
    }
}

#[async_trait]
impl RemoteTranslator for SarvamTranslator {
    async fn translate(&self, request: &RemoteRequest) -> VoyceResult<RemoteTranslation> {
        let body = SarvamRequestBody {
            input: &request.text,
            source_language_code: &request.source_language,
            target_language_code: &request.target_language,
            speaker_gender: "Male",
            mode: &request.mode,
            model: "mayura:v1",
            enable_preprocessing: true,
        };
        let response = self
            .client
            .post(&self.api_url)
            .header("API-Subscription-Key", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let parsed: SarvamResponseBody = response.json().await?;
        Ok(RemoteTranslation {
            translated_text: parsed.translated_text,
            confidence: parsed.confidence,
            pronunciation: parsed.pronunciation,
        })
    }
}

type CacheKey = (String, String, String);

/// Cache statistics, mostly for the console status view.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub target_languages: Vec<String>,
}

pub struct TranslationResolver {
    lexicon: Arc<LexiconStore>,
    remote: Option<Arc<dyn RemoteTranslator>>,
    /// (normalized phrase, from, to) -> result. Append-mostly; writes are
    /// idempotent so insert-if-absent is the only synchronization needed.
    cache: DashMap<CacheKey, TranslationResult>,
}

const REMOTE_DEFAULT_CONFIDENCE: f32 = 0.9;
const LOCAL_CONFIDENCE: f32 = 0.8;
const DEGRADED_CONFIDENCE: f32 = 0.1;

impl TranslationResolver {
    pub fn new(lexicon: Arc<LexiconStore>, remote: Option<Arc<dyn RemoteTranslator>>) -> Self {
        Self {
            lexicon,
            remote,
            cache: DashMap::new(),
        }
    }

    /// Resolves a phrase into the target language. Never fails: remote
    /// faults degrade to the lexicon, and a full miss yields a placeholder
    /// result which is not cached (a later retry with connectivity can
    /// still succeed).
    pub async fn resolve(
        &self,
        phrase: &str,
        from_lang: &str,
        to_lang: &str,
        connection: &ConnectionStatus,
    ) -> TranslationResult {
        let normalized = phrase.trim().to_lowercase();
        let key = (
            normalized.clone(),
            from_lang.to_string(),
            to_lang.to_string(),
        );

        if let Some(cached) = self.cache.get(&key) {
            let mut result = cached.clone();
            result.source = Provenance::Cached;
            debug!(phrase = %normalized, to_lang, "translation cache hit");
            return result;
        }

        if connection.is_online() {
            if let Some(remote) = &self.remote {
                let request = RemoteRequest {
                    text: normalized.clone(),
                    source_language: from_lang.to_string(),
                    target_language: to_lang.to_string(),
                    mode: "formal".to_string(),
                };
                match remote.translate(&request).await {
                    Ok(answer) => {
                        let result = TranslationResult {
                            pronunciation: answer
                                .pronunciation
                                .or_else(|| self.lexicon.pronunciation(&answer.translated_text, to_lang)),
                            cultural_note: Some(self.lexicon.cultural_note(&normalized, to_lang)),
                            translated_text: answer.translated_text,
                            confidence: answer.confidence.unwrap_or(REMOTE_DEFAULT_CONFIDENCE),
                            source: Provenance::Remote,
                            category: None,
                        };
                        self.cache.entry(key).or_insert_with(|| result.clone());
                        return result;
                    }
                    Err(e) => {
                        warn!(error = %e, phrase = %normalized, "remote translation failed, falling back to lexicon");
                    }
                }
            }
        }

        if let Some(local) = self.lexicon.lookup_phrase(&normalized, to_lang) {
            let result = TranslationResult {
                pronunciation: self.lexicon.pronunciation(&local.translation, to_lang),
                cultural_note: Some(self.lexicon.cultural_note(&local.phrase, to_lang)),
                translated_text: local.translation,
                confidence: LOCAL_CONFIDENCE,
                source: Provenance::LocalFallback,
                category: Some(local.category),
            };
            self.cache.entry(key).or_insert_with(|| result.clone());
            return result;
        }

        debug!(phrase = %normalized, to_lang, "no translation available, returning placeholder");
        TranslationResult {
            translated_text: format!("[Translation not available offline for \"{}\"]", phrase.trim()),
            confidence: DEGRADED_CONFIDENCE,
            pronunciation: None,
            cultural_note: Some(format!(
                "For accurate translation of \"{}\", please connect to the internet.",
                phrase.trim()
            )),
            source: Provenance::LocalFallback,
            category: None,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        let mut target_languages: Vec<String> = self
            .cache
            .iter()
            .map(|entry| entry.key().2.clone())
            .collect();
        target_languages.sort();
        target_languages.dedup();
        CacheStats {
            size: self.cache.len(),
            target_languages,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRemote {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubRemote {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl RemoteTranslator for StubRemote {
        async fn translate(&self, request: &RemoteRequest) -> VoyceResult<RemoteTranslation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(VoyceError::Translation("backend unreachable".to_string()));
            }
            Ok(RemoteTranslation {
                translated_text: format!("remote[{}->{}]", request.text, request.target_language),
                confidence: Some(0.95),
                pronunciation: None,
            })
        }
    }

    fn resolver(remote: Option<Arc<dyn RemoteTranslator>>) -> TranslationResolver {
        TranslationResolver::new(LexiconStore::shared(), remote)
    }

    #[tokio::test]
    async fn test_remote_result_is_cached_and_idempotent() {
        let stub = Arc::new(StubRemote::ok());
        let resolver = resolver(Some(stub.clone() as Arc<dyn RemoteTranslator>));
        let online = ConnectionStatus::online();

        let first = resolver.resolve("Hello", "en", "ta", &online).await;
        assert_eq!(first.source, Provenance::Remote);
        assert_eq!(first.confidence, 0.95);

        let second = resolver.resolve("hello", "en", "ta", &online).await;
        assert_eq!(second.source, Provenance::Cached);
        assert_eq!(second.translated_text, first.translated_text);
        assert_eq!(second.confidence, first.confidence);
        // Normalization makes "Hello" and "hello" the same key.
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cache_precedes_local_fallback_when_offline() {
        let stub = Arc::new(StubRemote::ok());
        let resolver = resolver(Some(stub as Arc<dyn RemoteTranslator>));

        let remote = resolver
            .resolve("hello", "en", "ta", &ConnectionStatus::online())
            .await;
        // Connectivity forced off: the cached remote value still wins over
        // the lexicon entry.
        let cached = resolver
            .resolve("hello", "en", "ta", &ConnectionStatus::offline())
            .await;
        assert_eq!(cached.source, Provenance::Cached);
        assert_eq!(cached.translated_text, remote.translated_text);
    }

    #[tokio::test]
    async fn test_remote_fault_degrades_to_lexicon() {
        let resolver = resolver(Some(Arc::new(StubRemote::failing())));
        let result = resolver
            .resolve("hello", "en", "ta", &ConnectionStatus::online())
            .await;
        assert_eq!(result.source, Provenance::LocalFallback);
        assert!(result.translated_text.contains("வணக்கம்"));
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.category.as_deref(), Some("greetings"));
    }

    #[tokio::test]
    async fn test_offline_lexicon_hit() {
        let resolver = resolver(None);
        let result = resolver
            .resolve("how do I say thank you", "en", "hi", &ConnectionStatus::offline())
            .await;
        assert_eq!(result.source, Provenance::LocalFallback);
        assert!(result.translated_text.contains("धन्यवाद"));
        assert!(result.cultural_note.as_deref().unwrap().contains("Dhanyawad"));
    }

    #[tokio::test]
    async fn test_full_miss_returns_placeholder_and_does_not_cache() {
        let resolver = resolver(None);
        let offline = ConnectionStatus::offline();

        let miss = resolver
            .resolve("quantum entanglement", "en", "ta", &offline)
            .await;
        assert_eq!(miss.confidence, 0.1);
        assert!(miss.translated_text.contains("not available offline"));
        assert!(miss
            .cultural_note
            .as_deref()
            .unwrap()
            .contains("connect to the internet"));
        assert_eq!(resolver.cache_stats().size, 0);

        // A later retry with connectivity and a working remote succeeds.
        let stub = Arc::new(StubRemote::ok());
        let retry_resolver = TranslationResolver::new(
            LexiconStore::shared(),
            Some(stub as Arc<dyn RemoteTranslator>),
        );
        let retry = retry_resolver
            .resolve("quantum entanglement", "en", "ta", &ConnectionStatus::online())
            .await;
        assert_eq!(retry.source, Provenance::Remote);
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let resolver = resolver(None);
        let offline = ConnectionStatus::offline();
        resolver.resolve("hello", "en", "ta", &offline).await;
        resolver.resolve("hello", "en", "hi", &offline).await;
        resolver.resolve("thank you", "en", "ta", &offline).await;
        let stats = resolver.cache_stats();
        assert_eq!(stats.size, 3);
        assert_eq!(stats.target_languages, vec!["hi".to_string(), "ta".to_string()]);
    }
}
