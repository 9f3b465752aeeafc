//! The full render of a session.

use crate::session::{Session, View};
use deskmate_core::persona::TONE_OPTIONS;
use deskmate_core::schedule::{self, DATE_FORMAT};
use deskmate_core::{ChatTurn, PersonaSettings};
use serde::Serialize;

/// A schedule row as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub date: String,
    /// `HH:MM`, or `None` for an entry without a time
    pub time: Option<String>,
    pub event: String,
}

/// Everything needed to draw the authenticated page.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub username: String,
    pub view: View,
    /// Newest first
    pub chat: Vec<ChatTurn>,
    pub doc_summary: Option<String>,
    /// Sorted by date, then time, entries without a time first
    pub schedule: Vec<ScheduleRow>,
    /// The saved persona, `None` until the user saves one
    pub persona: Option<PersonaSettings>,
    /// Initial values for the persona editor
    pub persona_form: PersonaSettings,
    pub tone_options: Vec<&'static str>,
}

impl PageView {
    pub fn render(session: &Session) -> Self {
        let schedule = schedule::sorted(session.schedule())
            .into_iter()
            .map(|e| ScheduleRow {
                date: e.date.format(DATE_FORMAT).to_string(),
                time: e.time.map(|_| e.time_label()),
                event: e.event,
            })
            .collect();

        Self {
            username: session.username().to_string(),
            view: session.view(),
            chat: session.chat().iter().rev().cloned().collect(),
            doc_summary: session.doc_summary().map(String::from),
            schedule,
            persona: session.persona().cloned(),
            persona_form: session.persona().cloned().unwrap_or_default(),
            tone_options: TONE_OPTIONS.to_vec(),
        }
    }
}
