//! The per-user session object.

use deskmate_core::error::StoreError;
use deskmate_core::schedule::{self, ScheduleEntry, ScheduleRecord};
use deskmate_core::{ChatTurn, PersonaSettings};
use deskmate_store::DocumentStore;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The authenticated menu.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// Document summary and chat
    #[default]
    DocumentQa,
    Schedule,
    Persona,
}

/// Everything known about a logged-in user.
///
/// Chat, schedule and persona mirror their artifacts. The document summary
/// lives only here and is gone at logout.
#[derive(Debug, Clone)]
pub struct Session {
    username: String,
    pub(crate) view: View,
    pub(crate) chat: Vec<ChatTurn>,
    pub(crate) schedule: Vec<ScheduleEntry>,
    pub(crate) persona: Option<PersonaSettings>,
    pub(crate) doc_summary: Option<String>,
    signed_out: bool,
}

impl Session {
    /// Load the user's artifacts. Returns load warnings (rows with an
    /// unreadable date or time) alongside the session.
    pub fn open(store: &DocumentStore, username: &str) -> Result<(Self, Vec<String>), StoreError> {
        let chat = store.load_chat(username)?;
        let records = store.load_schedule(username)?;
        let ingested = schedule::ingest(&records);
        let persona = store.load_persona(username)?;

        info!(
            username,
            chat_turns = chat.len(),
            schedule_entries = ingested.entries.len(),
            has_persona = persona.is_some(),
            "Session opened"
        );

        let session = Self {
            username: username.to_string(),
            view: View::default(),
            chat,
            schedule: ingested.entries,
            persona,
            doc_summary: None,
            signed_out: false,
        };
        Ok((session, ingested.warnings))
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Chat turns in insertion order (oldest first).
    pub fn chat(&self) -> &[ChatTurn] {
        &self.chat
    }

    /// Schedule entries in stored order.
    pub fn schedule(&self) -> &[ScheduleEntry] {
        &self.schedule
    }

    pub fn persona(&self) -> Option<&PersonaSettings> {
        self.persona.as_ref()
    }

    pub fn doc_summary(&self) -> Option<&str> {
        self.doc_summary.as_deref()
    }

    /// True once the session has been logged out. A signed-out session
    /// accepts no further actions.
    pub fn is_signed_out(&self) -> bool {
        self.signed_out
    }

    /// Drop all in-memory state. Artifacts on disk are untouched.
    pub(crate) fn sign_out(&mut self) {
        self.signed_out = true;
        self.doc_summary = None;
        self.chat.clear();
        self.schedule.clear();
        self.persona = None;
    }

    pub(crate) fn schedule_records(entries: &[ScheduleEntry]) -> Vec<ScheduleRecord> {
        entries.iter().map(ScheduleRecord::from).collect()
    }
}
