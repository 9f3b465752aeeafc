//! The assistant facade over a [`Provider`].

use chrono::NaiveDate;
use deskmate_core::error::ProviderError;
use deskmate_core::persona::{PersonaSettings, SystemInstruction, effective_temperature};
use deskmate_core::provider::{Provider, ProviderRequest};
use deskmate_core::schedule::{ScheduleEntry, agenda};
use std::sync::Arc;
use tracing::{debug, info};

use crate::document::truncate_chars;

/// Call parameters that do not vary per user.
#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub model: String,
    pub top_p: f32,
    pub language: String,
    /// Temperature for users without a saved persona
    pub temperature: f32,
    /// Output budget for chat answers
    pub max_tokens: u32,
    /// How much document text accompanies a summary request
    pub context_chars: usize,
    pub summary_max_tokens: u32,
    pub review_max_tokens: u32,
    pub suggest_max_tokens: u32,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self::from_config(&deskmate_config::AppConfig::default())
    }
}

impl AssistantSettings {
    pub fn from_config(config: &deskmate_config::AppConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            top_p: config.top_p,
            language: config.response_language.clone(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            context_chars: config.documents.context_chars,
            summary_max_tokens: config.documents.summary_max_tokens,
            review_max_tokens: 1024,
            suggest_max_tokens: 512,
        }
    }
}

/// Persona-aware access to the LLM.
pub struct Assistant {
    provider: Arc<dyn Provider>,
    settings: AssistantSettings,
}

impl Assistant {
    pub fn new(provider: Arc<dyn Provider>, settings: AssistantSettings) -> Self {
        Self { provider, settings }
    }

    pub fn settings(&self) -> &AssistantSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// One single-shot completion. Returns the generated text.
    pub async fn generate(
        &self,
        user_message: &str,
        system_instruction: &SystemInstruction,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest::single_shot(
            &self.settings.model,
            &system_instruction.render(),
            user_message,
            temperature,
            max_tokens,
        )
        .with_top_p(self.settings.top_p);

        debug!(
            provider = %self.provider.name(),
            temperature,
            max_tokens,
            "Generating"
        );

        let response = self.provider.complete(request).await?;
        if let Some(usage) = &response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Completion usage"
            );
        }
        Ok(response.message.content)
    }

    fn instruction(
        &self,
        persona: Option<&PersonaSettings>,
        context: Option<&str>,
    ) -> SystemInstruction {
        SystemInstruction::build(&self.settings.language, persona, context)
    }

    /// Answer a chat question, grounded on the current document summary.
    pub async fn answer(
        &self,
        question: &str,
        persona: Option<&PersonaSettings>,
        doc_summary: Option<&str>,
    ) -> Result<String, ProviderError> {
        let instruction = self.instruction(persona, doc_summary);
        self.generate(
            question,
            &instruction,
            effective_temperature(persona, self.settings.temperature),
            self.settings.max_tokens,
        )
        .await
    }

    /// Summarize extracted document text in a few sentences.
    ///
    /// Only the first `context_chars` characters are sent.
    pub async fn summarize_document(
        &self,
        text: &str,
        persona: Option<&PersonaSettings>,
    ) -> Result<String, ProviderError> {
        let excerpt = truncate_chars(text, self.settings.context_chars);
        info!(
            chars = excerpt.chars().count(),
            total_chars = text.chars().count(),
            "Summarizing document"
        );
        let instruction = self.instruction(persona, Some(excerpt));
        self.generate(
            "Summarize the document below concisely in 3-4 sentences.",
            &instruction,
            effective_temperature(persona, self.settings.temperature),
            self.settings.summary_max_tokens,
        )
        .await
    }

    /// Summarize the schedule and point out notable patterns.
    pub async fn review_schedule(
        &self,
        entries: &[ScheduleEntry],
        persona: Option<&PersonaSettings>,
    ) -> Result<String, ProviderError> {
        let message = format!(
            "My schedule:\n{}\nBased on this schedule, summarize the main points in 3-4 sentences, \
             and point out anything unusual or any important patterns.",
            agenda(entries)
        );
        self.generate(
            &message,
            &self.instruction(persona, None),
            effective_temperature(persona, self.settings.temperature),
            self.settings.review_max_tokens,
        )
        .await
    }

    /// Recommend a few light activities for the coming week.
    pub async fn suggest_schedule(
        &self,
        entries: &[ScheduleEntry],
        persona: Option<&PersonaSettings>,
        today: NaiveDate,
    ) -> Result<String, ProviderError> {
        let message = format!(
            "My existing schedule:\n{}\nToday is {}. Based on this, suggest 2-3 schedule items \
             for the next week (within 7 days of today). Prefer simple activities such as a walk, \
             reading or rest, and include a concrete date and time for each.",
            agenda(entries),
            today.format(deskmate_core::schedule::DATE_FORMAT)
        );
        self.generate(
            &message,
            &self.instruction(persona, None),
            effective_temperature(persona, self.settings.temperature),
            self.settings.suggest_max_tokens,
        )
        .await
    }
}
