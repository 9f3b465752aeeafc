//! Persona settings and system-instruction composition.
//!
//! The system instruction sent with every LLM call is assembled from clauses
//! in a fixed order:
//!
//! 1. **Base**: act as a personal assistant, answer in the target language
//! 2. **Tone**
//! 3. **Mind**
//! 4. **Focus areas**
//! 5. **Document context**: the current document summary, if any
//!
//! Each clause after the base is optional. Blank sources are skipped entirely,
//! so the instruction never carries an empty clause.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sampling temperature used when the user has never saved a persona.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// The tones offered by the persona editor, in display order.
pub const TONE_OPTIONS: [&str; 5] = [
    "Default (friendly and general)",
    "Professional (information-focused)",
    "Humorous (playful)",
    "Concise (short and to the point)",
    "Critical (analytical thinking)",
];

/// User-configurable parameters that shape the assistant's replies.
///
/// Singleton per user, overwritten wholesale on save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonaSettings {
    #[serde(default)]
    pub tone: String,

    #[serde(default)]
    pub mind: String,

    #[serde(default)]
    pub focus_areas: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl Default for PersonaSettings {
    fn default() -> Self {
        Self {
            tone: TONE_OPTIONS[0].to_string(),
            mind: String::new(),
            focus_areas: String::new(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl PersonaSettings {
    /// Check the settings as submitted from the persona editor.
    ///
    /// Returns a user-facing message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if !TONE_OPTIONS.contains(&self.tone.as_str()) {
            return Err(format!("Unknown tone '{}'.", self.tone));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 1.0.".into());
        }
        Ok(())
    }
}

/// The temperature to sample with for a user. `fallback` applies when the
/// user has never saved a persona.
pub fn effective_temperature(persona: Option<&PersonaSettings>, fallback: f32) -> f32 {
    persona.map_or(fallback, |p| p.temperature)
}

/// A composed system instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInstruction {
    clauses: Vec<String>,
}

impl SystemInstruction {
    /// Compose the instruction for a persona (possibly absent) and an optional
    /// document summary.
    pub fn build(
        language: &str,
        persona: Option<&PersonaSettings>,
        doc_summary: Option<&str>,
    ) -> Self {
        let mut clauses = vec![format!(
            "You are the user's personal assistant. Respond to everything in {language}."
        )];

        if let Some(p) = persona {
            if let Some(tone) = non_blank(&p.tone) {
                clauses.push(format!("Keep your tone '{tone}'."));
            }
            if let Some(mind) = non_blank(&p.mind) {
                clauses.push(format!("Answer with the following mindset: {mind}"));
            }
            if let Some(focus) = non_blank(&p.focus_areas) {
                clauses.push(format!(
                    "Focus especially on the following topics: {focus}"
                ));
            }
        }

        if let Some(summary) = doc_summary.and_then(non_blank) {
            clauses.push(format!(
                "Refer to the provided document summary when answering. Document summary: {summary}"
            ));
        }

        debug!(clauses = clauses.len(), "System instruction composed");
        Self { clauses }
    }

    /// The individual clauses, in order.
    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    /// The final instruction text (clauses joined by a single space).
    pub fn render(&self) -> String {
        self.clauses.join(" ")
    }
}

impl std::fmt::Display for SystemInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
