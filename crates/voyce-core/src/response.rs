//! Per-intent response generation.
//!
//! One handler per intent variant. Handlers are pure over the utterance and
//! the per-turn context snapshot, plus lexicon/resolver lookups keyed by the
//! current city (default-city fallback when absent). Only the Emergency
//! handler sets `auto_escalate`; the generator itself never starts timers.

use crate::error::VoyceResult;
use crate::intent::Intent;
use crate::lexicon::LexiconStore;
use crate::shared::{ConnectionStatus, ConversationContext};
use crate::translate::TranslationResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
        }
    }
}

/// Structured response for one turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub text: String,
    pub cultural_note: Option<String>,
    pub priority: Option<Priority>,
    /// Sole trigger the orchestrator reads to arm the escalation controller.
    pub auto_escalate: bool,
}

impl AssistantResponse {
    fn plain(text: String, cultural_note: impl Into<String>) -> Self {
        Self {
            text,
            cultural_note: Some(cultural_note.into()),
            priority: None,
            auto_escalate: false,
        }
    }
}

pub struct ResponseGenerator {
    lexicon: Arc<LexiconStore>,
    resolver: Arc<TranslationResolver>,
}

impl ResponseGenerator {
    pub fn new(lexicon: Arc<LexiconStore>, resolver: Arc<TranslationResolver>) -> Self {
        Self { lexicon, resolver }
    }

    /// Generates the response for a classified utterance. Designed not to
    /// fail (the resolver degrades instead of erroring); the `Result` is the
    /// defensive seam the orchestrator uses to keep a session alive if a
    /// handler ever does.
    pub async fn generate(
        &self,
        intent: Intent,
        transcript: &str,
        context: &ConversationContext,
        connection: &ConnectionStatus,
    ) -> VoyceResult<AssistantResponse> {
        let response = match intent {
            Intent::Translation => self.handle_translation(transcript, context, connection).await,
            Intent::CulturalInquiry => self.handle_cultural_inquiry(context),
            Intent::Emergency => self.handle_emergency(context),
            Intent::Navigation => self.handle_navigation(context),
            Intent::Dining => self.handle_dining(context),
            Intent::Transportation => self.handle_transportation(context),
            Intent::General => self.handle_general(transcript, context),
        };
        Ok(response)
    }

    async fn handle_translation(
        &self,
        transcript: &str,
        context: &ConversationContext,
        connection: &ConnectionStatus,
    ) -> AssistantResponse {
        let target = context.language.as_str();
        let lower = transcript.to_lowercase();

        if lower.contains("hello") {
            let resolved = self.resolver.resolve("hello", "en", target, connection).await;
            return AssistantResponse::plain(
                format!(
                    "In {}, you say: \"{}\". This is the most common and respectful way to greet someone locally.",
                    target.to_uppercase(),
                    resolved.translated_text
                ),
                "Remember to use appropriate body language - a slight bow or palms pressed together shows respect in many cultures.",
            );
        }

        if lower.contains("thank you") {
            let resolved = self
                .resolver
                .resolve("thank you", "en", target, connection)
                .await;
            return AssistantResponse::plain(
                format!(
                    "To say thank you in {}: \"{}\". Gratitude is universally appreciated and shows respect for local culture.",
                    target.to_uppercase(),
                    resolved.translated_text
                ),
                "In many cultures, a small bow or nod accompanies thanks to show sincerity.",
            );
        }

        AssistantResponse::plain(
            format!(
                "I can help you translate that into {}. For the phrase you mentioned, locals would typically say it with cultural context in mind. Would you like me to provide the exact pronunciation as well?",
                target.to_uppercase()
            ),
            "Translations are adapted for local customs and formality levels.",
        )
    }

    fn handle_cultural_inquiry(&self, context: &ConversationContext) -> AssistantResponse {
        let city = context.location.as_ref().and_then(|l| l.city.as_deref());
        let culture = self.lexicon.city_culture(city);
        AssistantResponse::plain(
            format!(
                "Here are important cultural customs for your location: {}. For greetings: {}. These practices show respect and help you connect better with locals.",
                culture.customs.join(", "),
                culture.greetings.join(", ")
            ),
            "Understanding local customs helps create meaningful connections and shows respect for the culture.",
        )
    }

    fn handle_emergency(&self, context: &ConversationContext) -> AssistantResponse {
        let country = context.location.as_ref().and_then(|l| l.country.as_deref());
        let numbers = self.lexicon.emergency_numbers(country);
        AssistantResponse {
            text: format!(
                "🚨 EMERGENCY ASSISTANCE: Important numbers for your location: {}. Your current location has been noted. Stay calm and I'm here to help guide you through any emergency situation.",
                numbers.join(", ")
            ),
            cultural_note: Some(
                "Keep these numbers saved in your phone. Hotel staff can also assist with local emergency services."
                    .to_string(),
            ),
            priority: Some(Priority::High),
            auto_escalate: true,
        }
    }

    fn handle_navigation(&self, context: &ConversationContext) -> AssistantResponse {
        AssistantResponse::plain(
            format!(
                "Based on your location in {}, I can help you navigate. For restaurants, head towards the main commercial district. For tourist attractions, I recommend checking popular landmarks nearby. Would you like specific walking directions?",
                context.city_display()
            ),
            "Local transportation includes various options. Always negotiate fares beforehand for auto-rickshaws and similar transport.",
        )
    }

    fn handle_dining(&self, context: &ConversationContext) -> AssistantResponse {
        let city = context.location.as_ref().and_then(|l| l.city.as_deref());
        let culture = self.lexicon.city_culture(city);
        AssistantResponse::plain(
            format!(
                "For dining in {}, I recommend trying local specialties. Look for busy restaurants - they usually have the freshest food. {}",
                context.city_display(),
                culture.dining.join(", ")
            ),
            "Busy local eateries often serve the most authentic and safe food. Don't hesitate to ask locals for recommendations.",
        )
    }

    fn handle_transportation(&self, context: &ConversationContext) -> AssistantResponse {
        let city = context.location.as_ref().and_then(|l| l.city.as_deref());
        let culture = self.lexicon.city_culture(city);
        AssistantResponse::plain(
            format!(
                "Transportation options in {}: {}",
                context.city_display(),
                culture.transportation.join(", ")
            ),
            "Always confirm the fare before starting your journey. Keep small bills handy for local transport.",
        )
    }

    fn handle_general(&self, transcript: &str, context: &ConversationContext) -> AssistantResponse {
        AssistantResponse::plain(
            format!(
                "I understand you're asking about \"{}\". As your travel companion in {}, I'm here to help with language, culture, navigation, and any challenges you face. What specific aspect would you like me to focus on?",
                transcript,
                context.city_display()
            ),
            "Feel free to ask about anything - from basic phrases to complex cultural situations. I'm designed to help you navigate like a local.",
        )
    }
}
